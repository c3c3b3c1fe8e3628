//! Per-job "terminal state already handled" marker.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use hookcut_models::JobId;

/// Ensures terminal side effects fire at most once per job id.
///
/// Clones share the same set, so one guard can span every session a
/// poller starts (or several pollers, if the caller shares it).
#[derive(Debug, Clone, Default)]
pub struct TerminalGuard {
    handled: Arc<Mutex<HashSet<JobId>>>,
}

impl TerminalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the terminal side effect for a job.
    ///
    /// Returns `true` only for the first claim.
    pub fn claim(&self, job_id: &JobId) -> bool {
        let mut handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        handled.insert(job_id.clone())
    }

    pub fn is_handled(&self, job_id: &JobId) -> bool {
        let handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        handled.contains(job_id)
    }

    /// Forget a job, e.g. when the user explicitly retries it.
    pub fn release(&self, job_id: &JobId) {
        let mut handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        handled.remove(job_id);
    }
}
