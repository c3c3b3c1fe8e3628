//! Poller metrics.
//!
//! - Status requests issued
//! - Transient failures ridden out
//! - Session outcomes and durations

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    pub const POLL_REQUESTS_TOTAL: &str = "hookcut_poll_requests_total";
    pub const POLL_TRANSIENT_ERRORS_TOTAL: &str = "hookcut_poll_transient_errors_total";
    pub const POLL_OUTCOMES_TOTAL: &str = "hookcut_poll_outcomes_total";
    pub const POLL_SESSION_SECONDS: &str = "hookcut_poll_session_seconds";
    pub const SUBMISSIONS_TOTAL: &str = "hookcut_submissions_total";
}

pub fn record_poll_request() {
    counter!(names::POLL_REQUESTS_TOTAL).increment(1);
}

pub fn record_transient_error() {
    counter!(names::POLL_TRANSIENT_ERRORS_TOTAL).increment(1);
}

pub fn record_outcome(kind: &'static str, elapsed: Duration) {
    counter!(names::POLL_OUTCOMES_TOTAL, "outcome" => kind).increment(1);
    histogram!(names::POLL_SESSION_SECONDS, "outcome" => kind).record(elapsed.as_secs_f64());
}

/// `result` is "ok", "rejected" or "failed".
pub fn record_submission(result: &'static str) {
    counter!(names::SUBMISSIONS_TOTAL, "result" => result).increment(1);
}
