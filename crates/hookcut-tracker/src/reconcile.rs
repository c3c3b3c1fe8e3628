//! Turning one status response into the next poll step.

use std::time::Duration;

use hookcut_models::{estimate_eta, Eta, JobId, JobSnapshot, StatusClass, UiStatus};

use crate::config::MissingResultPolicy;

/// Shown when the backend fails a job without saying why.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Processing failed. Please try again.";

/// Shown when the client gives up waiting.
pub const TIMEOUT_MESSAGE: &str = "Processing timed out";

/// Non-terminal state published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate {
    pub job_id: JobId,
    pub ui_status: UiStatus,
    /// Always in [0, 1]
    pub progress: f64,
    pub eta: Eta,
    pub raw_status: String,
}

/// How a poll session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done {
        url: String,
        filename: Option<String>,
    },
    Failed {
        message: String,
    },
    TimedOut {
        elapsed: Duration,
    },
    /// Stopped by the caller or superseded by a newer session
    Cancelled,
}

impl PollOutcome {
    /// Everything except cancellation is a terminal job state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Cancelled)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PollOutcome::Done { .. } => "done",
            PollOutcome::Failed { .. } => "failed",
            PollOutcome::TimedOut { .. } => "timed_out",
            PollOutcome::Cancelled => "cancelled",
        }
    }

    /// User-facing error text, if this outcome is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            PollOutcome::Failed { message } => Some(message),
            PollOutcome::TimedOut { .. } => Some(TIMEOUT_MESSAGE),
            _ => None,
        }
    }
}

/// What the loop does after a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Publish the update and poll again
    Continue(PollUpdate),
    /// Done without a URL: ask the download endpoint, keep polling if that fails
    FetchDownload(PollUpdate),
    /// Stop polling
    Finish(PollOutcome),
}

/// Decide the next step from a normalized snapshot.
pub fn reconcile(snapshot: &JobSnapshot, elapsed: Duration, policy: MissingResultPolicy) -> Step {
    match snapshot.class {
        StatusClass::Done => match &snapshot.result {
            Some(result) => Step::Finish(PollOutcome::Done {
                url: result.video_url.clone(),
                filename: result.filename.clone(),
            }),
            None => {
                // Backend says done but the result is not published yet.
                let update = PollUpdate {
                    job_id: snapshot.id.clone(),
                    ui_status: UiStatus::UploadingResult,
                    progress: snapshot.progress,
                    eta: estimate_eta(elapsed, snapshot.progress),
                    raw_status: snapshot.raw_status.clone(),
                };
                match policy {
                    MissingResultPolicy::KeepPolling => Step::Continue(update),
                    MissingResultPolicy::FetchDownload => Step::FetchDownload(update),
                }
            }
        },
        StatusClass::Failed => Step::Finish(PollOutcome::Failed {
            message: snapshot
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string()),
        }),
        StatusClass::Active => Step::Continue(PollUpdate {
            job_id: snapshot.id.clone(),
            ui_status: snapshot.ui_status,
            progress: snapshot.progress,
            eta: estimate_eta(elapsed, snapshot.progress),
            raw_status: snapshot.raw_status.clone(),
        }),
    }
}
