//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_http_requests_total` (counter): requests by method, route, status
//! - `gateway_http_request_duration_seconds` (histogram): handler latency
//! - `gateway_rpc_calls_total` (counter): JSON-RPC calls by method, outcome
//! - `gateway_rpc_call_duration_seconds` (histogram): JSON-RPC latency incl. failover
//! - `gateway_rpc_failovers_total` (counter): provider attempts that failed over
//! - `gateway_transactions_total` (counter): terminal transaction states by function
//! - `gateway_transaction_confirmation_seconds` (histogram): build to terminal state
//! - `gateway_transactions_in_flight` (gauge)
//! - `gateway_chain_connected` (gauge): 1=reachable, 0=unreachable
//! - `gateway_credential_operations_total` (counter): domain writes by operation, outcome
//! - `gateway_list_omitted_total` (counter): listing entries dropped on fetch failure
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::blockchain::TxState;

/// Start the Prometheus scrape endpoint on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    counter!(
        "gateway_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_http_request_duration_seconds", "route" => route.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_rpc_call(method: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "ok" } else { "error" };
    counter!("gateway_rpc_calls_total", "method" => method, "outcome" => outcome).increment(1);
    histogram!("gateway_rpc_call_duration_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
}

pub fn record_rpc_failover(method: &'static str) {
    counter!("gateway_rpc_failovers_total", "method" => method).increment(1);
}

pub fn record_transaction(function: &str, state: TxState) {
    counter!(
        "gateway_transactions_total",
        "function" => function.to_string(),
        "outcome" => state.as_str()
    )
    .increment(1);
}

pub fn record_transaction_duration(function: &str, elapsed: Duration) {
    histogram!("gateway_transaction_confirmation_seconds", "function" => function.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn set_transactions_in_flight(count: usize) {
    gauge!("gateway_transactions_in_flight").set(count as f64);
}

pub fn set_chain_connected(connected: bool) {
    gauge!("gateway_chain_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_credential_operation(operation: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("gateway_credential_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_list_omitted(listing: &'static str, omitted: usize) {
    counter!("gateway_list_omitted_total", "listing" => listing).increment(omitted as u64);
}
