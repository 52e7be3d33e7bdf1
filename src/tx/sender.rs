//! Send pipeline: resolve options, build, sign and broadcast
//!
//! Each submission runs `validate -> resolve -> build -> sign -> broadcast`
//! once. The first failing stage aborts the submission and is counted in
//! metrics. Nothing is retried.

use super::builder::{ResolvedOptions, TransactionBuilder, TransactionOptions};
use super::gas::GasPriceAdvisor;
use super::nonce::NonceResolver;
use super::MoacTransaction;
use crate::chain::{Network, NodeRpc};
use crate::error::{MoacError, MoacResult};
use crate::metrics;
use crate::validator::{validate, Check};
use crate::wallet;

use ethers::types::U256;
use std::sync::Arc;
use tracing::{debug, info};

/// Default gas limit of a submission
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// Default minimum gas price in sha
pub const DEFAULT_MIN_GAS_PRICE: u64 = super::gas::DEFAULT_GAS_PRICE;

/// Runs the send pipeline against one node
pub struct TransactionSender {
    node: Arc<dyn NodeRpc>,
    builder: TransactionBuilder,
    gas: GasPriceAdvisor,
    nonces: NonceResolver,
    gas_limit: U256,
    min_gas_price: U256,
}

impl TransactionSender {
    /// Create a sender with the default gas limit and minimum gas price
    pub fn new(node: Arc<dyn NodeRpc>, network: Network) -> Self {
        let min_gas_price = U256::from(DEFAULT_MIN_GAS_PRICE);
        Self {
            gas: GasPriceAdvisor::with_default(node.clone(), min_gas_price),
            nonces: NonceResolver::new(node.clone()),
            builder: TransactionBuilder::new(network),
            node,
            gas_limit: U256::from(DEFAULT_GAS_LIMIT),
            min_gas_price,
        }
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn gas_advisor(&self) -> &GasPriceAdvisor {
        &self.gas
    }

    pub fn nonce_resolver(&self) -> &NonceResolver {
        &self.nonces
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn set_gas_limit(&mut self, gas_limit: U256) {
        self.gas_limit = gas_limit;
    }

    pub fn min_gas_price(&self) -> U256 {
        self.min_gas_price
    }

    /// Set the minimum gas price, also used as the fallback when the node
    /// cannot report one
    pub fn set_min_gas_price(&mut self, min_gas_price: U256) {
        self.min_gas_price = min_gas_price;
        self.gas = GasPriceAdvisor::with_default(self.node.clone(), min_gas_price);
    }

    /// Fill missing options from chain state: nonce, then gas price, then gas limit
    pub async fn resolve_options(
        &self,
        options: &TransactionOptions,
        address: &str,
    ) -> MoacResult<ResolvedOptions> {
        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => self.nonces.get_nonce(address).await?,
        };
        let gas_price = match options.gas_price {
            Some(price) => price,
            None => self.gas.get_gas_price(Some(self.min_gas_price)).await,
        };
        let gas_limit = options.gas_limit.unwrap_or(self.gas_limit);

        Ok(ResolvedOptions {
            gas_limit,
            gas_price,
            nonce,
        })
    }

    /// Sign a record with `secret`
    pub fn sign(&self, tx: &MoacTransaction, secret: &str) -> MoacResult<String> {
        wallet::sign_transaction(tx, secret)
    }

    /// Submit a signed transaction once, returning its hash
    pub async fn broadcast(&self, signed: &str) -> MoacResult<String> {
        let hash = self.node.send_raw_transaction(signed).await?;
        metrics::record_tx_broadcast(self.builder.network().chain_id());
        info!("Transaction broadcast: {}", hash);
        Ok(hash)
    }

    /// Run the full pipeline for a transaction carrying `calldata`.
    ///
    /// `to` is `None` for contract creation.
    pub async fn send_with_call_data(
        &self,
        secret: &str,
        to: Option<&str>,
        value: &str,
        calldata: Option<&str>,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        stage("validate", self.validate(secret, to))?;
        let from = wallet::get_address(secret)
            .ok_or_else(|| MoacError::InvalidSecret(secret.to_string()))?;

        let resolved = stage("resolve", self.resolve_options(options, &from).await)?;
        let tx = stage(
            "build",
            self.builder.build_with(&from, to, &resolved, value, calldata),
        )?;
        let signed = stage("sign", self.sign(&tx, secret))?;
        stage("broadcast", self.broadcast(&signed).await)
    }

    fn validate(&self, secret: &str, to: Option<&str>) -> MoacResult<()> {
        match to {
            Some(to) => validate(
                &[(0, Check::MoacSecret), (1, Check::MoacAddress)],
                &[secret, to],
            ),
            None => validate(&[(0, Check::MoacSecret)], &[secret]),
        }
    }
}

fn stage<T>(name: &str, result: MoacResult<T>) -> MoacResult<T> {
    match &result {
        Ok(_) => debug!("Stage {} done", name),
        Err(e) => {
            debug!("Stage {} failed: {}", name, e);
            metrics::record_stage_failure(name);
        }
    }
    result
}
