//! Prometheus metrics for the middleware stack.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090).
//! Recording functions are no-ops until [`init_metrics`] installs the exporter.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `idempotency_outcomes_total` - Idempotent requests by final cache status (label: status)
//! - `idempotency_cache_errors_total` - Swallowed cache store failures (label: operation)
//! - `idempotency_late_completions_total` - Handlers that finished after their caller timed out
//!
//! ## Histograms
//! - `http_request_duration_seconds` - Request duration (labels: method, tag)

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const IDEMPOTENCY_OUTCOMES_TOTAL: &str = "idempotency_outcomes_total";
    pub const IDEMPOTENCY_CACHE_ERRORS_TOTAL: &str = "idempotency_cache_errors_total";
    pub const IDEMPOTENCY_LATE_COMPLETIONS_TOTAL: &str = "idempotency_late_completions_total";
    pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Returns
///
/// `Ok(())` if initialization succeeds, `Err` with message otherwise.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::IDEMPOTENCY_OUTCOMES_TOTAL,
        "Idempotent requests by final cache status"
    );
    describe_counter!(
        names::IDEMPOTENCY_CACHE_ERRORS_TOTAL,
        "Cache store failures that were logged and swallowed"
    );
    describe_counter!(
        names::IDEMPOTENCY_LATE_COMPLETIONS_TOTAL,
        "Handlers that completed after their caller received TIMEDOUT"
    );
    describe_histogram!(
        names::REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record the final cache status of an idempotent request.
pub fn record_idempotency_outcome(status: &str) {
    counter!(names::IDEMPOTENCY_OUTCOMES_TOTAL, "status" => status.to_string()).increment(1);
}

/// Record a swallowed cache failure (`read` or `write`).
pub fn record_cache_error(operation: &'static str) {
    counter!(names::IDEMPOTENCY_CACHE_ERRORS_TOTAL, "operation" => operation).increment(1);
}

/// Record a handler result that arrived after its caller was released.
pub fn record_late_completion() {
    counter!(names::IDEMPOTENCY_LATE_COMPLETIONS_TOTAL).increment(1);
}

/// Record HTTP request duration, labeled by the terminal log tag.
pub fn record_request_duration(method: &str, tag: &str, duration_secs: f64) {
    histogram!(names::REQUEST_DURATION_SECONDS, "method" => method.to_string(), "tag" => tag.to_string())
        .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Recording without an installed exporter must be a no-op.

    #[test]
    fn test_record_idempotency_outcome() {
        record_idempotency_outcome("FromCache");
    }

    #[test]
    fn test_record_cache_error() {
        record_cache_error("read");
        record_cache_error("write");
    }

    #[test]
    fn test_record_request_duration() {
        record_request_duration("POST", "SUCCESS", 0.1);
    }
}
