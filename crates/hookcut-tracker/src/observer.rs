//! Observers receiving poll updates and terminal outcomes.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::info;

use hookcut_models::{Eta, JobId, UiStatus};

use crate::reconcile::{PollOutcome, PollUpdate};

/// Receives what a poll session sees.
///
/// Called from the session task; implementations must not block.
pub trait PollObserver: Send + Sync {
    /// A non-terminal response was reconciled.
    fn on_update(&self, update: &PollUpdate);

    /// The job reached a terminal state. Fires at most once per job id.
    fn on_terminal(&self, job_id: &JobId, outcome: &PollOutcome);
}

/// The status/progress record a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    pub job_id: Option<JobId>,
    pub status: UiStatus,
    /// Always in [0, 1]
    pub progress: f64,
    /// `None` once the job is terminal
    pub eta: Option<Eta>,
    pub preview_url: Option<String>,
    pub error: Option<String>,
}

impl UiState {
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Publishes the latest [`UiState`] on a watch channel.
#[derive(Debug)]
pub struct WatchObserver {
    tx: watch::Sender<UiState>,
}

impl WatchObserver {
    pub fn new() -> (Self, watch::Receiver<UiState>) {
        let (tx, rx) = watch::channel(UiState::default());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }

    /// Show the upload phase that precedes polling.
    pub fn set_uploading(&self) {
        self.tx.send_replace(UiState {
            status: UiStatus::Uploading,
            eta: Some(Eta::Estimating),
            ..UiState::default()
        });
    }

    /// Surface an error that happened before a job existed.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            state.status = UiStatus::Error;
            state.eta = None;
            state.error = Some(message);
        });
    }
}

impl PollObserver for WatchObserver {
    fn on_update(&self, update: &PollUpdate) {
        self.tx.send_modify(|state| {
            if state.job_id.as_ref() != Some(&update.job_id) {
                *state = UiState {
                    job_id: Some(update.job_id.clone()),
                    ..UiState::default()
                };
            }
            state.status = update.ui_status;
            state.progress = update.progress;
            state.eta = Some(update.eta);
        });
    }

    fn on_terminal(&self, job_id: &JobId, outcome: &PollOutcome) {
        self.tx.send_modify(|state| {
            state.job_id = Some(job_id.clone());
            state.eta = None;
            match outcome {
                PollOutcome::Done { url, .. } => {
                    state.status = UiStatus::Done;
                    state.progress = 1.0;
                    state.preview_url = Some(url.clone());
                    state.error = None;
                }
                PollOutcome::Failed { .. } | PollOutcome::TimedOut { .. } => {
                    state.status = UiStatus::Error;
                    state.error = outcome.error_message().map(str::to_string);
                }
                PollOutcome::Cancelled => {}
            }
        });
    }
}

/// Logs status changes through tracing.
#[derive(Debug, Default)]
pub struct LogObserver {
    last: Mutex<Option<(JobId, UiStatus)>>,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PollObserver for LogObserver {
    fn on_update(&self, update: &PollUpdate) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let changed = last
            .as_ref()
            .map(|(job, status)| *job != update.job_id || *status != update.ui_status)
            .unwrap_or(true);

        if changed {
            info!(
                job_id = %update.job_id,
                status = %update.ui_status,
                raw_status = %update.raw_status,
                progress = update.progress,
                "Job status changed"
            );
            *last = Some((update.job_id.clone(), update.ui_status));
        }
    }

    fn on_terminal(&self, job_id: &JobId, outcome: &PollOutcome) {
        info!(job_id = %job_id, outcome = outcome.kind(), "Job finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update(job: &str, status: UiStatus, progress: f64) -> PollUpdate {
        PollUpdate {
            job_id: JobId::from_string(job),
            ui_status: status,
            progress,
            eta: Eta::Estimating,
            raw_status: status.to_string(),
        }
    }

    #[test]
    fn test_watch_observer_tracks_updates() {
        let (observer, rx) = WatchObserver::new();
        observer.on_update(&update("abc123", UiStatus::Analyzing, 0.1));

        let state = rx.borrow().clone();
        assert_eq!(state.status, UiStatus::Analyzing);
        assert_eq!(state.percent(), 10);
        assert_eq!(state.job_id, Some(JobId::from_string("abc123")));
    }

    #[test]
    fn test_watch_observer_done_sets_preview() {
        let (observer, rx) = WatchObserver::new();
        observer.on_update(&update("abc123", UiStatus::Rendering, 0.8));
        observer.on_terminal(
            &JobId::from_string("abc123"),
            &PollOutcome::Done {
                url: "https://x/y.mp4".into(),
                filename: None,
            },
        );

        let state = rx.borrow().clone();
        assert_eq!(state.status, UiStatus::Done);
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.eta, None);
        assert_eq!(state.preview_url.as_deref(), Some("https://x/y.mp4"));
    }

    #[test]
    fn test_watch_observer_timeout_message() {
        let (observer, rx) = WatchObserver::new();
        observer.on_terminal(
            &JobId::from_string("abc123"),
            &PollOutcome::TimedOut {
                elapsed: Duration::from_secs(600),
            },
        );
        let state = rx.borrow().clone();
        assert_eq!(state.status, UiStatus::Error);
        assert_eq!(state.error.as_deref(), Some("Processing timed out"));
    }

    #[test]
    fn test_watch_observer_resets_for_new_job() {
        let (observer, rx) = WatchObserver::new();
        observer.on_terminal(
            &JobId::from_string("old"),
            &PollOutcome::Failed {
                message: "boom".into(),
            },
        );
        observer.on_update(&update("new", UiStatus::Hook, 0.2));

        let state = rx.borrow().clone();
        assert_eq!(state.status, UiStatus::Hook);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_set_uploading_then_error() {
        let (observer, rx) = WatchObserver::new();
        observer.set_uploading();
        assert_eq!(rx.borrow().status, UiStatus::Uploading);
        observer.set_error("Job creation failed");
        assert_eq!(rx.borrow().error.as_deref(), Some("Job creation failed"));
    }
}
