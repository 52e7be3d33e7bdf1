//! Chain module - the node RPC surface consumed by the toolkit
//!
//! This module provides:
//! - The `NodeRpc` seam every component talks to
//! - An HTTP JSON-RPC implementation for MOAC nodes
//! - Network selection and shared RPC types
//! - Receipt event helpers

pub mod provider;
pub mod receipt;

pub use provider::MoacProvider;

use crate::error::MoacResult;

use async_trait::async_trait;
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// MOAC network the transactions are signed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn from_mainnet(mainnet: bool) -> Self {
        if mainnet {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }

    /// Network id used as the chain id of signed transactions
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 99,
            Network::Testnet => 101,
        }
    }
}

/// Block selector for block lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Hash(String),
    Tag(String),
}

impl BlockId {
    /// Interpret a user supplied selector: a tag, a 32-byte hash or a decimal/hex number
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "latest" | "earliest" | "pending" => return Some(BlockId::Tag(raw.to_string())),
            _ => {}
        }
        if let Some(hex) = raw.strip_prefix("0x") {
            if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(BlockId::Hash(raw.to_string()));
            }
            return u64::from_str_radix(hex, 16).ok().map(BlockId::Number);
        }
        raw.parse::<u64>().ok().map(BlockId::Number)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "{:#x}", n),
            BlockId::Hash(h) => write!(f, "{}", h),
            BlockId::Tag(t) => write!(f, "{}", t),
        }
    }
}

/// Pending section of `txpool_content`: sender -> queued entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingPoolSnapshot {
    #[serde(default)]
    pub pending: HashMap<String, HashMap<String, Value>>,
}

impl PendingPoolSnapshot {
    /// Number of pending entries queued under `address`, matched ignoring case
    pub fn pending_for(&self, address: &str) -> usize {
        self.pending
            .iter()
            .filter(|(sender, _)| sender.eq_ignore_ascii_case(address))
            .map(|(_, entries)| entries.len())
            .sum()
    }
}

/// RPC surface of a MOAC node used by the toolkit
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Balance in sha at the latest block
    async fn get_balance(&self, address: &str) -> MoacResult<U256>;

    /// Confirmed transaction count at the latest block
    async fn get_transaction_count(&self, address: &str) -> MoacResult<u64>;

    /// Pending pool contents
    async fn txpool_content(&self) -> MoacResult<PendingPoolSnapshot>;

    /// Node's current gas price in sha
    async fn gas_price(&self) -> MoacResult<U256>;

    /// Submit a signed raw transaction, returning its hash
    async fn send_raw_transaction(&self, signed: &str) -> MoacResult<String>;

    async fn get_transaction(&self, hash: &str) -> MoacResult<Option<Value>>;

    async fn get_transaction_receipt(&self, hash: &str) -> MoacResult<Option<Value>>;

    async fn get_block(&self, block: &BlockId) -> MoacResult<Option<Value>>;

    /// Simulated execution against the latest state
    async fn call(&self, to: &str, data: &str) -> MoacResult<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_ids() {
        assert_eq!(Network::from_mainnet(true).chain_id(), 99);
        assert_eq!(Network::from_mainnet(false).chain_id(), 101);
    }

    #[test]
    fn test_block_id_parse() {
        assert_eq!(BlockId::parse("latest"), Some(BlockId::Tag("latest".to_string())));
        assert_eq!(BlockId::parse("1"), Some(BlockId::Number(1)));
        assert_eq!(BlockId::parse("0x10"), Some(BlockId::Number(16)));
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(BlockId::parse(&hash), Some(BlockId::Hash(hash.clone())));
        assert_eq!(BlockId::parse("nope"), None);
        assert_eq!(BlockId::Number(255).to_string(), "0xff");
    }

    #[test]
    fn test_pending_pool_counts_case_insensitively() {
        let snapshot: PendingPoolSnapshot = serde_json::from_value(json!({
            "pending": {
                "0xABCDEF0000000000000000000000000000000001": { "3": {}, "4": {} },
                "0x0000000000000000000000000000000000000002": { "0": {} }
            },
            "queued": {}
        }))
        .unwrap();

        assert_eq!(snapshot.pending_for("0xabcdef0000000000000000000000000000000001"), 2);
        assert_eq!(snapshot.pending_for("0x0000000000000000000000000000000000000002"), 1);
        assert_eq!(snapshot.pending_for("0x0000000000000000000000000000000000000003"), 0);
    }

    #[test]
    fn test_pending_pool_without_pending_key() {
        let snapshot: PendingPoolSnapshot = serde_json::from_value(json!({})).unwrap();
        assert_eq!(snapshot.pending_for("0x0000000000000000000000000000000000000002"), 0);
    }
}
