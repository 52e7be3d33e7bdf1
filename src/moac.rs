//! Toolkit client for one MOAC node
//!
//! `Moac` owns the node handle, the network selection and the gas settings,
//! and exposes the account level operations. Contract wrappers build on it.

use crate::abi::{self, Contract, Dispatch};
use crate::chain::{BlockId, MoacProvider, Network, NodeRpc};
use crate::config::Settings;
use crate::error::MoacResult;
use crate::tx::{MoacTransaction, ResolvedOptions, TransactionOptions, TransactionSender};
use crate::units::{from_sha, parse_quantity};
use crate::validator::{validate, Check};

use ethers::abi::{Abi, Token};
use ethers::types::U256;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Moac {
    node: Arc<dyn NodeRpc>,
    sender: TransactionSender,
    network: Network,
}

impl Moac {
    /// Create a client on `node` for mainnet (chain id 99) or testnet (101)
    pub fn new(node: Arc<dyn NodeRpc>, mainnet: bool) -> Self {
        let network = Network::from_mainnet(mainnet);
        Self {
            sender: TransactionSender::new(node.clone(), network),
            node,
            network,
        }
    }

    /// Connect to the node and apply the gas settings from configuration
    pub fn connect(settings: &Settings) -> MoacResult<Self> {
        let provider = MoacProvider::new(&settings.node.url)?;
        let mut moac = Self::new(Arc::new(provider), settings.node.mainnet);
        moac.set_gas_limit(U256::from(settings.gas.gas_limit));
        moac.set_min_gas_price(U256::from(settings.gas.min_gas_price));

        info!(
            "Connected to {} ({:?}, chain id {})",
            settings.node.url,
            moac.network,
            moac.network.chain_id()
        );
        Ok(moac)
    }

    pub fn node(&self) -> Arc<dyn NodeRpc> {
        self.node.clone()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn gas_limit(&self) -> U256 {
        self.sender.gas_limit()
    }

    pub fn set_gas_limit(&mut self, gas_limit: U256) {
        self.sender.set_gas_limit(gas_limit);
    }

    pub fn min_gas_price(&self) -> U256 {
        self.sender.min_gas_price()
    }

    pub fn set_min_gas_price(&mut self, min_gas_price: U256) {
        self.sender.set_min_gas_price(min_gas_price);
    }

    /// Balance in MOAC at full precision, `"0"` if the query fails
    pub async fn get_balance(&self, address: &str) -> String {
        match self.node.get_balance(address).await {
            Ok(balance) => from_sha(balance),
            Err(e) => {
                debug!("Balance query for {} failed: {}", address, e);
                "0".to_string()
            }
        }
    }

    /// Next usable nonce, counting the sender's pending pool entries
    pub async fn get_nonce(&self, address: &str) -> MoacResult<u64> {
        self.sender.nonce_resolver().get_nonce(address).await
    }

    /// Node gas price in sha as a decimal string, raised to `floor`
    pub async fn get_gas_price(&self, floor: Option<U256>) -> String {
        self.sender.gas_advisor().get_gas_price(floor).await.to_string()
    }

    /// Confirmed transaction count only
    pub async fn get_transaction_count(&self, address: &str) -> MoacResult<u64> {
        self.node.get_transaction_count(address).await
    }

    /// Assemble an unsigned record
    #[allow(clippy::too_many_arguments)]
    pub fn get_tx(
        &self,
        from: &str,
        to: Option<&str>,
        nonce: u64,
        gas_limit: U256,
        gas_price: U256,
        value: &str,
        calldata: Option<&str>,
    ) -> MoacResult<MoacTransaction> {
        self.sender
            .builder()
            .build(from, to, nonce, gas_limit, gas_price, value, calldata)
    }

    pub fn sign_transaction(&self, tx: &MoacTransaction, secret: &str) -> MoacResult<String> {
        self.sender.sign(tx, secret)
    }

    /// Broadcast a signed transaction, returning its hash
    pub async fn send_signed_transaction(&self, signed: &str) -> MoacResult<String> {
        self.sender.broadcast(signed).await
    }

    /// Transaction by hash, `None` when the node does not know it
    pub async fn get_transaction(&self, hash: &str) -> MoacResult<Option<Value>> {
        validate(&[(0, Check::Hash)], &[hash])?;
        self.node.get_transaction(&hash.to_lowercase()).await
    }

    pub async fn get_transaction_receipt(&self, hash: &str) -> MoacResult<Option<Value>> {
        validate(&[(0, Check::Hash)], &[hash])?;
        self.node.get_transaction_receipt(&hash.to_lowercase()).await
    }

    /// Block by number, hash or tag, `None` if it cannot be fetched
    pub async fn get_block(&self, block: &str) -> Option<Value> {
        let id = match BlockId::parse(block) {
            Some(id) => id,
            None => {
                warn!("Unrecognised block selector {}", block);
                return None;
            }
        };

        match self.node.get_block(&id).await {
            Ok(block) => block,
            Err(e) => {
                debug!("Block query for {} failed: {}", id, e);
                None
            }
        }
    }

    /// Number of the latest block, `None` if it cannot be fetched
    pub async fn get_block_number(&self) -> Option<u64> {
        let block = self.get_block("latest").await?;
        let number = block.get("number")?.as_str()?;
        parse_quantity(number).ok().and_then(|n| u64::try_from(n).ok())
    }

    /// Fill missing options: nonce, then gas price (floored at the minimum), then gas limit
    pub async fn get_options(
        &self,
        options: &TransactionOptions,
        address: &str,
    ) -> MoacResult<ResolvedOptions> {
        self.sender.resolve_options(options, address).await
    }

    /// Sign and submit a transaction carrying `calldata` to `to`
    pub async fn send_transaction_with_call_data(
        &self,
        secret: &str,
        to: &str,
        value: &str,
        calldata: Option<&str>,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        self.sender
            .send_with_call_data(secret, Some(to), value, calldata, options)
            .await
    }

    /// Transfer `amount` MOAC, attaching `memo` as URI-component encoded data
    pub async fn transfer_moac(
        &self,
        secret: &str,
        to: &str,
        amount: &str,
        memo: Option<&str>,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[(0, Check::MoacSecret), (1, Check::MoacAddress), (2, Check::Amount)],
            &[secret, to, amount],
        )?;

        let calldata = memo
            .filter(|memo| !memo.is_empty())
            .map(|memo| format!("0x{}", hex::encode(encode_uri_component(memo))));

        self.send_transaction_with_call_data(secret, to, amount, calldata.as_deref(), options)
            .await
    }

    /// Bind an ABI to a contract address
    pub fn contract(&self, abi: Abi, address: &str) -> MoacResult<Contract> {
        Contract::new(address, abi)
    }

    /// Dispatch `name` on `contract` through this node
    pub async fn call_contract(
        &self,
        contract: &Contract,
        name: &str,
        args: &[Token],
    ) -> MoacResult<Dispatch> {
        abi::dispatch(self.node.as_ref(), contract, name, args).await
    }
}

/// Percent-encode every byte outside `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
pub fn encode_uri_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
