//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_router_http_requests_total` (counter): admin API requests by method, status
//! - `wallet_router_http_request_duration_seconds` (histogram): admin API latency
//! - `wallet_router_dispatch_total` (counter): outbound requests by transport
//! - `wallet_router_config_mutations_total` (counter): document writes by operation
//! - `wallet_router_authorization_denied_total` (counter): rejected wallet mutations
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing
//! - Prometheus exporter is opt-in via configuration

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one admin API request.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    counter!(
        "wallet_router_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "wallet_router_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record an outbound request and the transport chosen for it.
pub fn record_dispatch(transport: &'static str) {
    counter!("wallet_router_dispatch_total", "transport" => transport).increment(1);
}

/// Record a successful routing document write.
pub fn record_mutation(operation: &'static str) {
    counter!("wallet_router_config_mutations_total", "operation" => operation).increment(1);
}

/// Record a wallet mutation rejected by the ownership gate.
pub fn record_authorization_denied() {
    counter!("wallet_router_authorization_denied_total").increment(1);
}
