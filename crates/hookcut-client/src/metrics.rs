//! Job API client metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total job API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "hookcut_api_client_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "hookcut_api_client_latency_seconds";
}

/// Record metrics for a completed request. `status` is 0 for transport failures.
pub fn record_request(operation: &'static str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation
    )
    .record(latency_ms / 1000.0);
}
