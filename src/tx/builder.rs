//! MOAC transaction record assembly

use crate::chain::Network;
use crate::error::MoacResult;
use crate::units::{to_hex, to_sha};

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Call-data used when none is supplied
pub const EMPTY_CALL_DATA: &str = "0x00";

/// Unsigned MOAC transaction, every numeric field as a `0x` hex quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoacTransaction {
    pub from: String,
    /// Omitted for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub nonce: String,
    pub gas_limit: String,
    pub gas_price: String,
    pub value: String,
    pub data: String,
    pub chain_id: String,
    pub sharding_flag: String,
    pub system_contract: String,
    pub via: String,
}

/// Caller-supplied overrides for a submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub nonce: Option<u64>,
}

impl TransactionOptions {
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Options after every missing field has been filled from chain state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub gas_limit: U256,
    pub gas_price: U256,
    pub nonce: u64,
}

/// Assembles transaction records for one network
#[derive(Debug, Clone, Copy)]
pub struct TransactionBuilder {
    network: Network,
}

impl TransactionBuilder {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Build the record for a transfer of `value` MOAC.
    ///
    /// `to` is `None` for contract creation. Missing or empty call-data
    /// becomes `0x00`.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        from: &str,
        to: Option<&str>,
        nonce: u64,
        gas_limit: U256,
        gas_price: U256,
        value: &str,
        calldata: Option<&str>,
    ) -> MoacResult<MoacTransaction> {
        let value = to_sha(value)?;
        let data = match calldata {
            Some(data) if !data.is_empty() => data.to_string(),
            _ => EMPTY_CALL_DATA.to_string(),
        };

        Ok(MoacTransaction {
            from: from.to_string(),
            to: to.map(str::to_string),
            nonce: to_hex(U256::from(nonce)),
            gas_limit: to_hex(gas_limit),
            gas_price: to_hex(gas_price),
            value: to_hex(value),
            data,
            chain_id: format!("{:#x}", self.network.chain_id()),
            sharding_flag: "0x0".to_string(),
            system_contract: "0x0".to_string(),
            via: "0x".to_string(),
        })
    }

    /// Build from resolved options
    pub fn build_with(
        &self,
        from: &str,
        to: Option<&str>,
        options: &ResolvedOptions,
        value: &str,
        calldata: Option<&str>,
    ) -> MoacResult<MoacTransaction> {
        self.build(
            from,
            to,
            options.nonce,
            options.gas_limit,
            options.gas_price,
            value,
            calldata,
        )
    }
}
