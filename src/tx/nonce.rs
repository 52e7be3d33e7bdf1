//! Nonce resolution from confirmed and pending state
//!
//! The next usable nonce is the confirmed transaction count plus the number
//! of entries the node holds in its pending pool for the sender.
//!
//! Nothing is reserved locally: two resolutions for the same sender that race
//! before either transaction reaches the pool return the same nonce. Callers
//! must serialize submissions per sender.

use crate::chain::NodeRpc;
use crate::error::MoacResult;

use std::sync::Arc;
use tracing::debug;

/// Resolves the next nonce for an address
pub struct NonceResolver {
    node: Arc<dyn NodeRpc>,
}

impl NonceResolver {
    pub fn new(node: Arc<dyn NodeRpc>) -> Self {
        Self { node }
    }

    /// Next usable nonce: confirmed count + pending entries for `address`
    pub async fn get_nonce(&self, address: &str) -> MoacResult<u64> {
        let confirmed = self.node.get_transaction_count(address).await?;
        let pool = self.node.txpool_content().await?;
        let pending = pool.pending_for(address) as u64;

        debug!(
            "Resolved nonce for {}: {} confirmed + {} pending",
            address, confirmed, pending
        );
        Ok(confirmed + pending)
    }
}
