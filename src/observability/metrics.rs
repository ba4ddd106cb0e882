//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, status
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_remote_fetch_total` (counter): downloads by outcome
//! - `gateway_upstream_dispatch_total` (counter): dispatches by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   deployments without the exporter pay nothing
//! - Prometheus exporter is opt-in (`observability.metrics_enabled`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a finished gateway request.
pub fn record_request(endpoint: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());
}

/// Record a remote image download outcome ("ok", "timeout", "error", "rejected").
pub fn record_fetch(outcome: &'static str) {
    metrics::counter!("gateway_remote_fetch_total", "outcome" => outcome).increment(1);
}

/// Record an upstream dispatch outcome ("ok", "timeout", "unreachable").
pub fn record_dispatch(outcome: &'static str) {
    metrics::counter!("gateway_upstream_dispatch_total", "outcome" => outcome).increment(1);
}
