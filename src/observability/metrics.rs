//! Metrics collection and exposition.
//!
//! # Metrics
//! - `prompthash_http_requests_total` (counter): requests by method, route, status
//! - `prompthash_http_request_duration_seconds` (histogram): latency distribution
//! - `prompthash_tx_submissions_total` (counter): submissions by workflow step and outcome
//! - `prompthash_tx_poll_attempts` (histogram): status polls needed per submission
//! - `prompthash_store_records` (gauge): users and prompts held by the store
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "prompthash_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "prompthash_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the terminal outcome of one submission round.
pub fn record_submission(step: &str, outcome: &str) {
    counter!(
        "prompthash_tx_submissions_total",
        "step" => step.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record how many status polls a submission took.
pub fn record_poll_attempts(step: &str, attempts: u32) {
    histogram!("prompthash_tx_poll_attempts", "step" => step.to_string()).record(attempts as f64);
}

/// Record store sizes.
pub fn record_store_size(users: usize, prompts: usize) {
    gauge!("prompthash_store_records", "kind" => "users").set(users as f64);
    gauge!("prompthash_store_records", "kind" => "prompts").set(prompts as f64);
}
