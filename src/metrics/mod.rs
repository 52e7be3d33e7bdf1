//! Prometheus metrics for the transaction pipeline
//!
//! Exposes metrics for:
//! - Broadcast outcomes
//! - Pipeline failures per stage
//! - RPC errors per method
//! - Gas price fallbacks

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder};

lazy_static! {
    // Transaction metrics
    pub static ref TX_BROADCAST: CounterVec = register_counter_vec!(
        "moac_transactions_broadcast_total",
        "Total signed transactions accepted by the node",
        &["chain_id"]
    ).unwrap();

    pub static ref TX_STAGE_FAILED: CounterVec = register_counter_vec!(
        "moac_transaction_stage_failures_total",
        "Total send pipeline failures by stage",
        &["stage"]
    ).unwrap();

    // Node metrics
    pub static ref RPC_ERRORS: CounterVec = register_counter_vec!(
        "moac_rpc_errors_total",
        "Total RPC errors by method",
        &["method"]
    ).unwrap();

    pub static ref GAS_PRICE_FALLBACK: Counter = register_counter!(
        "moac_gas_price_fallback_total",
        "Total gas price queries answered with the configured default"
    ).unwrap();

    // Contract metrics
    pub static ref CONTRACT_CALLS: CounterVec = register_counter_vec!(
        "moac_contract_dispatch_total",
        "Total ABI dispatches by route",
        &["route"]
    ).unwrap();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_tx_broadcast(chain_id: u64) {
    TX_BROADCAST
        .with_label_values(&[&chain_id.to_string()])
        .inc();
}

pub fn record_stage_failure(stage: &str) {
    TX_STAGE_FAILED.with_label_values(&[stage]).inc();
}

pub fn record_rpc_error(method: &str) {
    RPC_ERRORS.with_label_values(&[method]).inc();
}

pub fn record_gas_price_fallback() {
    GAS_PRICE_FALLBACK.inc();
}

pub fn record_dispatch(route: &str) {
    CONTRACT_CALLS.with_label_values(&[route]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_rendered() {
        record_rpc_error("mc_gasPrice");
        record_stage_failure("broadcast");
        let text = gather_text();
        assert!(text.contains("moac_rpc_errors_total"));
        assert!(text.contains("method=\"mc_gasPrice\""));
        assert!(text.contains("stage=\"broadcast\""));
    }

    #[test]
    fn test_gas_price_fallback_counter() {
        let before = GAS_PRICE_FALLBACK.get();
        record_gas_price_fallback();
        assert!(GAS_PRICE_FALLBACK.get() >= before + 1.0);
        assert!(gather_text().contains("moac_gas_price_fallback_total"));
    }
}
