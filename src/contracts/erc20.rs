//! ERC20 token wrapper

use super::address_token;
use crate::abi::{string_at, uint_at, Contract};
use crate::error::{MoacError, MoacResult};
use crate::moac::Moac;
use crate::tx::TransactionOptions;
use crate::units::{format_amount, parse_amount};
use crate::validator::{validate, Check};

use ethers::abi::Token;
use ethers::types::U256;
use std::sync::Arc;
use tracing::debug;

pub struct Erc20 {
    moac: Arc<Moac>,
    contract: Contract,
}

impl Erc20 {
    /// Bind the token contract at `address`
    pub fn new(moac: Arc<Moac>, address: &str) -> MoacResult<Self> {
        Ok(Self {
            contract: Contract::erc20(address)?,
            moac,
        })
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub async fn name(&self) -> MoacResult<String> {
        let values = self.read("name", &[]).await?;
        string_at(&values, 0)
    }

    pub async fn symbol(&self) -> MoacResult<String> {
        let values = self.read("symbol", &[]).await?;
        string_at(&values, 0)
    }

    pub async fn decimals(&self) -> MoacResult<u32> {
        let values = self.read("decimals", &[]).await?;
        let decimals = uint_at(&values, 0)?;
        if decimals > U256::from(77u64) {
            return Err(MoacError::Decode(format!("unsupported decimals {}", decimals)));
        }
        Ok(decimals.as_u32())
    }

    /// Total supply in the smallest unit
    pub async fn total_supply(&self) -> MoacResult<U256> {
        let values = self.read("totalSupply", &[]).await?;
        uint_at(&values, 0)
    }

    /// Balance scaled by the token decimals, `"0"` if the query fails
    pub async fn balance_of(&self, address: &str) -> String {
        match self.try_balance_of(address).await {
            Ok(balance) => balance,
            Err(e) => {
                debug!("Token balance of {} failed: {}", address, e);
                "0".to_string()
            }
        }
    }

    /// Remaining allowance in the smallest unit
    pub async fn allowance(&self, owner: &str, spender: &str) -> MoacResult<U256> {
        validate(
            &[(0, Check::MoacAddress), (1, Check::MoacAddress)],
            &[owner, spender],
        )?;
        let values = self
            .read("allowance", &[address_token(owner)?, address_token(spender)?])
            .await?;
        uint_at(&values, 0)
    }

    /// Transfer `amount` tokens to `to`, returning the transaction hash
    pub async fn transfer(
        &self,
        secret: &str,
        to: &str,
        amount: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[(0, Check::MoacSecret), (1, Check::MoacAddress), (2, Check::Amount)],
            &[secret, to, amount],
        )?;
        let value = self.scaled(amount).await?;
        let calldata = self
            .encode("transfer", &[address_token(to)?, Token::Uint(value)])
            .await?;
        self.submit(secret, &calldata, options).await
    }

    pub async fn approve(
        &self,
        secret: &str,
        spender: &str,
        amount: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[(0, Check::MoacSecret), (1, Check::MoacAddress), (2, Check::Amount)],
            &[secret, spender, amount],
        )?;
        let value = self.scaled(amount).await?;
        let calldata = self
            .encode("approve", &[address_token(spender)?, Token::Uint(value)])
            .await?;
        self.submit(secret, &calldata, options).await
    }

    pub async fn transfer_from(
        &self,
        secret: &str,
        from: &str,
        to: &str,
        amount: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[
                (0, Check::MoacSecret),
                (1, Check::MoacAddress),
                (2, Check::MoacAddress),
                (3, Check::Amount),
            ],
            &[secret, from, to, amount],
        )?;
        let value = self.scaled(amount).await?;
        let calldata = self
            .encode(
                "transferFrom",
                &[address_token(from)?, address_token(to)?, Token::Uint(value)],
            )
            .await?;
        self.submit(secret, &calldata, options).await
    }

    async fn try_balance_of(&self, address: &str) -> MoacResult<String> {
        let values = self.read("balanceOf", &[address_token(address)?]).await?;
        let balance = uint_at(&values, 0)?;
        let decimals = self.decimals().await?;
        Ok(format_amount(balance, decimals))
    }

    async fn scaled(&self, amount: &str) -> MoacResult<U256> {
        let decimals = self.decimals().await?;
        parse_amount(amount, decimals)
    }

    async fn read(&self, name: &str, args: &[Token]) -> MoacResult<Vec<Token>> {
        self.moac
            .call_contract(&self.contract, name, args)
            .await?
            .into_values()
    }

    async fn encode(&self, name: &str, args: &[Token]) -> MoacResult<String> {
        self.moac
            .call_contract(&self.contract, name, args)
            .await?
            .into_call_data()
    }

    async fn submit(
        &self,
        secret: &str,
        calldata: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        self.moac
            .send_transaction_with_call_data(secret, &self.contract.address, "0", Some(calldata), options)
            .await
    }
}
