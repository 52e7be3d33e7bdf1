//! ERC721 non-fungible token wrapper

use super::{address_token, uint_token};
use crate::abi::{address_at, bool_at, string_at, uint_at, Contract};
use crate::error::{MoacError, MoacResult};
use crate::moac::Moac;
use crate::tx::TransactionOptions;
use crate::validator::{validate, Check};
use crate::wallet;

use ethers::abi::Token;
use ethers::types::U256;
use std::sync::Arc;
use tracing::debug;

pub struct Erc721 {
    moac: Arc<Moac>,
    contract: Contract,
}

impl Erc721 {
    pub fn new(moac: Arc<Moac>, address: &str) -> MoacResult<Self> {
        Ok(Self {
            contract: Contract::erc721(address)?,
            moac,
        })
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub async fn name(&self) -> MoacResult<String> {
        string_at(&self.read("name", vec![]).await?, 0)
    }

    pub async fn symbol(&self) -> MoacResult<String> {
        string_at(&self.read("symbol", vec![]).await?, 0)
    }

    pub async fn token_uri(&self, token_id: &str) -> MoacResult<String> {
        let values = self.read("tokenURI", vec![uint_token(token_id)?]).await?;
        string_at(&values, 0)
    }

    /// Number of tokens held by `owner`, `"0"` if the query fails
    pub async fn balance_of(&self, owner: &str) -> MoacResult<String> {
        validate(&[(0, Check::MoacAddress)], &[owner])?;
        let balance = match self.read("balanceOf", vec![address_token(owner)?]).await {
            Ok(values) => uint_at(&values, 0).map(|b| b.to_string()),
            Err(e) => Err(e),
        };
        Ok(balance.unwrap_or_else(|e| {
            debug!("NFT balance of {} failed: {}", owner, e);
            "0".to_string()
        }))
    }

    pub async fn owner_of(&self, token_id: &str) -> MoacResult<String> {
        let values = self.read("ownerOf", vec![uint_token(token_id)?]).await?;
        address_at(&values, 0)
    }

    pub async fn get_approved(&self, token_id: &str) -> MoacResult<String> {
        let values = self.read("getApproved", vec![uint_token(token_id)?]).await?;
        address_at(&values, 0)
    }

    pub async fn is_approved_for_all(&self, owner: &str, operator: &str) -> MoacResult<bool> {
        validate(
            &[(0, Check::MoacAddress), (1, Check::MoacAddress)],
            &[owner, operator],
        )?;
        let values = self
            .read(
                "isApprovedForAll",
                vec![address_token(owner)?, address_token(operator)?],
            )
            .await?;
        bool_at(&values, 0)
    }

    pub async fn total_supply(&self) -> MoacResult<U256> {
        uint_at(&self.read("totalSupply", vec![]).await?, 0)
    }

    pub async fn token_by_index(&self, index: &str) -> MoacResult<U256> {
        let values = self.read("tokenByIndex", vec![uint_token(index)?]).await?;
        uint_at(&values, 0)
    }

    pub async fn token_of_owner_by_index(&self, owner: &str, index: &str) -> MoacResult<U256> {
        validate(&[(0, Check::MoacAddress)], &[owner])?;
        let values = self
            .read(
                "tokenOfOwnerByIndex",
                vec![address_token(owner)?, uint_token(index)?],
            )
            .await?;
        uint_at(&values, 0)
    }

    /// Mint `token_id` with metadata `uri` to `to`
    pub async fn mint(
        &self,
        secret: &str,
        to: &str,
        token_id: &str,
        uri: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, to])?;
        let args = vec![
            address_token(to)?,
            uint_token(token_id)?,
            Token::String(uri.to_string()),
        ];
        self.submit(secret, "mint", args, options).await
    }

    pub async fn burn(
        &self,
        secret: &str,
        owner: &str,
        token_id: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, owner])?;
        let args = vec![address_token(owner)?, uint_token(token_id)?];
        self.submit(secret, "burn", args, options).await
    }

    /// Safe transfer from the secret's account; `data` selects the four argument overload
    pub async fn safe_transfer_from(
        &self,
        secret: &str,
        to: &str,
        token_id: &str,
        data: Option<&str>,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, to])?;
        let mut args = vec![
            address_token(&sender(secret)?)?,
            address_token(to)?,
            uint_token(token_id)?,
        ];
        if let Some(data) = data.filter(|d| !d.is_empty()) {
            let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data))
                .map_err(|e| MoacError::Abi(format!("invalid data {}: {}", data, e)))?;
            args.push(Token::Bytes(bytes));
        }
        self.submit(secret, "safeTransferFrom", args, options).await
    }

    pub async fn transfer_from(
        &self,
        secret: &str,
        to: &str,
        token_id: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, to])?;
        let args = vec![
            address_token(&sender(secret)?)?,
            address_token(to)?,
            uint_token(token_id)?,
        ];
        self.submit(secret, "transferFrom", args, options).await
    }

    pub async fn approve(
        &self,
        secret: &str,
        approved: &str,
        token_id: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, approved])?;
        let args = vec![address_token(approved)?, uint_token(token_id)?];
        self.submit(secret, "approve", args, options).await
    }

    pub async fn set_approval_for_all(
        &self,
        secret: &str,
        operator: &str,
        approved: bool,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(&[(0, Check::MoacSecret), (1, Check::MoacAddress)], &[secret, operator])?;
        let args = vec![address_token(operator)?, Token::Bool(approved)];
        self.submit(secret, "setApprovalForAll", args, options).await
    }

    async fn read(&self, name: &str, args: Vec<Token>) -> MoacResult<Vec<Token>> {
        self.moac
            .call_contract(&self.contract, name, &args)
            .await?
            .into_values()
    }

    async fn submit(
        &self,
        secret: &str,
        name: &str,
        args: Vec<Token>,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        let calldata = self
            .moac
            .call_contract(&self.contract, name, &args)
            .await?
            .into_call_data()?;
        self.moac
            .send_transaction_with_call_data(secret, &self.contract.address, "0", Some(&calldata), options)
            .await
    }
}

fn sender(secret: &str) -> MoacResult<String> {
    wallet::get_address(secret).ok_or_else(|| MoacError::InvalidSecret(secret.to_string()))
}
