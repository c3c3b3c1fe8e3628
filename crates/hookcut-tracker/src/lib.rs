//! Job submission and status tracking for HookCut.
//!
//! This crate provides:
//! - [`JobSubmitter`]: validate, upload and create a job
//! - [`Poller`]: one cancellable status loop per owner, with geometric
//!   backoff and a wall-clock ceiling
//! - Observers that turn poll updates into UI state or log lines

pub mod backoff;
pub mod config;
pub mod guard;
pub mod logging;
pub mod metrics;
pub mod observer;
pub mod poller;
pub mod reconcile;
pub mod submit;


pub use backoff::{Backoff, FailureLog, MIN_BACKOFF};
pub use config::{MissingResultPolicy, PollerConfig};
pub use guard::TerminalGuard;
pub use logging::JobLogger;
pub use observer::{LogObserver, PollObserver, UiState, WatchObserver};
pub use poller::{PollHandle, Poller, PollerBuilder};
pub use reconcile::{reconcile, PollOutcome, PollUpdate, Step, FALLBACK_FAILURE_MESSAGE, TIMEOUT_MESSAGE};
pub use submit::{CreationFailure, JobSubmitter, SubmitError, SubmitResult, Submission};
