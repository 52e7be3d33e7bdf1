//! HTTP JSON-RPC provider for MOAC nodes
//!
//! MOAC exposes the Ethereum-style API under the `mc_` namespace, so the
//! typed `ethers` helpers are bypassed in favour of raw `request` calls.

use super::{BlockId, NodeRpc, PendingPoolSnapshot};
use crate::error::{MoacError, MoacResult};
use crate::metrics;

use async_trait::async_trait;
use ethers::providers::{Http, Provider, RpcError};
use ethers::types::{Bytes, U256};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-RPC client bound to a single MOAC node
pub struct MoacProvider {
    url: String,
    http: Provider<Http>,
}

impl MoacProvider {
    /// Create a provider for the node at `url`
    pub fn new(url: &str) -> MoacResult<Self> {
        let http = Provider::<Http>::try_from(url)
            .map_err(|e| MoacError::Config(format!("Invalid node url {}: {}", url, e)))?
            .interval(Duration::from_millis(100));

        debug!("Added HTTP provider for node {}", url);

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Node url
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T, R>(&self, method: &str, params: T) -> MoacResult<R>
    where
        T: Debug + Serialize + Send + Sync,
        R: Serialize + DeserializeOwned + Debug + Send,
    {
        debug!("RPC {} -> {}", method, self.url);
        self.http.request(method, params).await.map_err(|e| {
            metrics::record_rpc_error(method);
            let message = e
                .as_error_response()
                .map(|resp| resp.message.clone())
                .unwrap_or_else(|| e.to_string());
            warn!("RPC {} failed: {}", method, message);
            MoacError::Rpc(message)
        })
    }
}

fn quantity_to_u64(method: &str, value: U256) -> MoacResult<u64> {
    u64::try_from(value)
        .map_err(|_| MoacError::Decode(format!("{} returned {} which exceeds u64", method, value)))
}

#[async_trait]
impl NodeRpc for MoacProvider {
    async fn get_balance(&self, address: &str) -> MoacResult<U256> {
        self.request("mc_getBalance", (address, "latest")).await
    }

    async fn get_transaction_count(&self, address: &str) -> MoacResult<u64> {
        let count: U256 = self
            .request("mc_getTransactionCount", (address, "latest"))
            .await?;
        quantity_to_u64("mc_getTransactionCount", count)
    }

    async fn txpool_content(&self) -> MoacResult<PendingPoolSnapshot> {
        self.request("txpool_content", ()).await
    }

    async fn gas_price(&self) -> MoacResult<U256> {
        self.request("mc_gasPrice", ()).await
    }

    async fn send_raw_transaction(&self, signed: &str) -> MoacResult<String> {
        self.request("mc_sendRawTransaction", [signed]).await
    }

    async fn get_transaction(&self, hash: &str) -> MoacResult<Option<Value>> {
        self.request("mc_getTransactionByHash", [hash]).await
    }

    async fn get_transaction_receipt(&self, hash: &str) -> MoacResult<Option<Value>> {
        self.request("mc_getTransactionReceipt", [hash]).await
    }

    async fn get_block(&self, block: &BlockId) -> MoacResult<Option<Value>> {
        let method = match block {
            BlockId::Hash(_) => "mc_getBlockByHash",
            BlockId::Number(_) | BlockId::Tag(_) => "mc_getBlockByNumber",
        };
        self.request(method, (block.to_string(), false)).await
    }

    async fn call(&self, to: &str, data: &str) -> MoacResult<Bytes> {
        self.request("mc_call", (json!({ "to": to, "data": data }), "latest"))
            .await
    }
}
