//! Gas price advice with a configurable floor

use crate::chain::NodeRpc;
use crate::metrics;

use ethers::types::U256;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default gas price in sha, used when the node cannot be queried
pub const DEFAULT_GAS_PRICE: u64 = 20_000_000_000;

/// Queries the node gas price and never fails
pub struct GasPriceAdvisor {
    node: Arc<dyn NodeRpc>,
    /// Substituted when `mc_gasPrice` fails
    default_price: U256,
}

impl GasPriceAdvisor {
    /// Create a new advisor with the default fallback price
    pub fn new(node: Arc<dyn NodeRpc>) -> Self {
        Self::with_default(node, U256::from(DEFAULT_GAS_PRICE))
    }

    pub fn with_default(node: Arc<dyn NodeRpc>, default_price: U256) -> Self {
        Self {
            node,
            default_price,
        }
    }

    pub fn default_price(&self) -> U256 {
        self.default_price
    }

    /// Current gas price, raised to `floor` when lower
    pub async fn get_gas_price(&self, floor: Option<U256>) -> U256 {
        let price = match self.node.gas_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!(
                    "Gas price query failed, using default {}: {}",
                    self.default_price, e
                );
                metrics::record_gas_price_fallback();
                self.default_price
            }
        };

        let price = match floor {
            Some(floor) if price < floor => floor,
            _ => price,
        };

        debug!("Gas price: {}", price);
        price
    }
}
