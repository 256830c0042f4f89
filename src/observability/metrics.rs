//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): requests by method and status
//! - `bridge_request_duration_seconds` (histogram): latency by method
//! - `bridge_binding_diagnostics_total` (counter): binding failures by origin
//! - `bridge_invocations_total` (counter): RPC calls by method and outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::binding::ParamSource;

/// Start the Prometheus scrape endpoint and install it as the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "bridge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("bridge_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_binding_diagnostic(origin: ParamSource) {
    counter!("bridge_binding_diagnostics_total", "origin" => origin.as_str()).increment(1);
}

/// Record an RPC outcome: `ok` or `error`.
pub fn record_invocation(method: &str, outcome: &'static str) {
    counter!(
        "bridge_invocations_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
