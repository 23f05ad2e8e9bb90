//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Approval and zap-in submissions and confirmations
//! - Classified failures
//! - In-flight pending transactions

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "zapper_transactions_submitted_total",
        "Total transactions submitted by operation",
        &["network", "operation"]
    ).expect("register zapper_transactions_submitted_total");

    pub static ref TX_CONFIRMED: CounterVec = register_counter_vec!(
        "zapper_transactions_confirmed_total",
        "Total transactions confirmed by operation",
        &["network", "operation"]
    ).expect("register zapper_transactions_confirmed_total");

    pub static ref FAILURES: CounterVec = register_counter_vec!(
        "zapper_failures_total",
        "Total reported failures by category",
        &["category"]
    ).expect("register zapper_failures_total");

    pub static ref CONFIRMATION_LATENCY: HistogramVec = register_histogram_vec!(
        "zapper_confirmation_latency_seconds",
        "Time from submission to receipt",
        &["operation"],
        vec![1.0, 3.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).expect("register zapper_confirmation_latency_seconds");

    pub static ref PENDING_TXNS: Gauge = register_gauge!(
        "zapper_pending_transactions",
        "Transactions submitted and not yet settled"
    ).expect("register zapper_pending_transactions");
}

/// Text exposition of every registered metric
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_tx_submitted(network: u64, operation: &str) {
    TX_SUBMITTED
        .with_label_values(&[&network.to_string(), operation])
        .inc();
}

pub fn record_tx_confirmed(network: u64, operation: &str, latency_secs: f64) {
    TX_CONFIRMED
        .with_label_values(&[&network.to_string(), operation])
        .inc();
    CONFIRMATION_LATENCY
        .with_label_values(&[operation])
        .observe(latency_secs);
}

pub fn record_failure(category: &str) {
    FAILURES.with_label_values(&[category]).inc();
}

pub fn record_pending_delta(delta: f64) {
    PENDING_TXNS.add(delta);
}
