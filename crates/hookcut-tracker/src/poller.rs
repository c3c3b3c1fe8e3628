//! The job status poller.
//!
//! One [`Poller`] owns at most one live poll session. Each session runs as
//! a tokio task that issues strictly sequential status requests, backing
//! off geometrically between them, until the job reaches a terminal state,
//! the wall-clock ceiling passes, or the session is cancelled.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use hookcut_client::{ClientError, JobApi};
use hookcut_models::{DefaultVocabulary, JobId, JobSnapshot, StatusVocabulary, UiStatus};

use crate::backoff::{Backoff, FailureLog};
use crate::config::PollerConfig;
use crate::guard::TerminalGuard;
use crate::logging::JobLogger;
use crate::metrics::{record_outcome, record_poll_request, record_transient_error};
use crate::observer::PollObserver;
use crate::reconcile::{reconcile, PollOutcome, PollUpdate, Step};

/// Handle to a running poll session.
#[derive(Debug, Clone)]
pub struct PollHandle {
    job_id: JobId,
    token: CancellationToken,
    outcome: watch::Receiver<Option<PollOutcome>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Stop the session at its next loop boundary.
    ///
    /// A request already in flight still completes; its result is dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Wait for the session to end.
    pub async fn wait(&self) -> PollOutcome {
        let mut rx = self.outcome.clone();
        let result = rx.wait_for(Option::is_some).await;
        match result {
            Ok(outcome) => outcome.clone().unwrap_or(PollOutcome::Cancelled),
            // Session task went away without reporting
            Err(_) => PollOutcome::Cancelled,
        }
    }
}

/// Builder for [`Poller`].
pub struct PollerBuilder {
    api: Arc<dyn JobApi>,
    config: PollerConfig,
    vocabulary: Arc<dyn StatusVocabulary>,
    observers: Vec<Arc<dyn PollObserver>>,
    guard: TerminalGuard,
}

impl PollerBuilder {
    pub fn config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different status vocabulary than the built-in table.
    pub fn vocabulary(mut self, vocabulary: Arc<dyn StatusVocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Share a terminal guard with other pollers.
    pub fn terminal_guard(mut self, guard: TerminalGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn build(self) -> Poller {
        Poller {
            api: self.api,
            config: self.config,
            vocabulary: self.vocabulary,
            observers: self.observers.into(),
            guard: self.guard,
            current: Mutex::new(None),
        }
    }
}

/// Polls job status on behalf of one owner (a view, a CLI command).
pub struct Poller {
    api: Arc<dyn JobApi>,
    config: PollerConfig,
    vocabulary: Arc<dyn StatusVocabulary>,
    observers: Arc<[Arc<dyn PollObserver>]>,
    guard: TerminalGuard,
    current: Mutex<Option<PollHandle>>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Poller {
    pub fn builder(api: Arc<dyn JobApi>) -> PollerBuilder {
        PollerBuilder {
            api,
            config: PollerConfig::default(),
            vocabulary: Arc::new(DefaultVocabulary),
            observers: Vec::new(),
            guard: TerminalGuard::new(),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn terminal_guard(&self) -> &TerminalGuard {
        &self.guard
    }

    /// Start polling a job, cancelling whatever session was running before.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, job_id: JobId) -> PollHandle {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            if !previous.is_finished() {
                debug!(
                    previous = %previous.job_id,
                    next = %job_id,
                    "Cancelling superseded poll session"
                );
            }
            previous.cancel();
        }

        let token = CancellationToken::new();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        let session = PollSession {
            job_id: job_id.clone(),
            api: Arc::clone(&self.api),
            vocabulary: Arc::clone(&self.vocabulary),
            observers: Arc::clone(&self.observers),
            guard: self.guard.clone(),
            config: self.config.clone(),
            token: token.clone(),
        };
        let logger = JobLogger::new(&job_id, "poll");
        let span = logger.create_span();

        tokio::spawn(
            async move {
                let outcome = session.run(&logger).await;
                let _ = outcome_tx.send(Some(outcome));
            }
            .instrument(span),
        );

        let handle = PollHandle {
            job_id,
            token,
            outcome: outcome_rx,
        };
        *current = Some(handle.clone());
        handle
    }

    /// Cancel the current session, if any.
    pub fn cancel(&self) {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = current.as_ref() {
            handle.cancel();
        }
    }

    /// Handle of the most recently started session.
    pub fn current(&self) -> Option<PollHandle> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.clone()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Response decoding problems are retried like transport failures.
fn is_retryable(err: &ClientError) -> bool {
    err.is_transient() || matches!(err, ClientError::Json(_) | ClientError::InvalidResponse(_))
}

struct PollSession {
    job_id: JobId,
    api: Arc<dyn JobApi>,
    vocabulary: Arc<dyn StatusVocabulary>,
    observers: Arc<[Arc<dyn PollObserver>]>,
    guard: TerminalGuard,
    config: PollerConfig,
    token: CancellationToken,
}

impl PollSession {
    async fn run(self, logger: &JobLogger) -> PollOutcome {
        logger.log_start(&format!(
            "polling (timeout {:?}, backoff {:?}..{:?})",
            self.config.timeout, self.config.initial_backoff, self.config.max_backoff
        ));

        let started_at = Instant::now();
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut failures = FailureLog::new(self.config.max_logged_failures);
        let mut last_status: Option<UiStatus> = None;
        let mut attempt: u32 = 0;

        let outcome = loop {
            if self.token.is_cancelled() {
                break PollOutcome::Cancelled;
            }
            let elapsed = started_at.elapsed();
            if elapsed >= self.config.timeout {
                break PollOutcome::TimedOut { elapsed };
            }

            attempt += 1;
            record_poll_request();
            let result = self.api.get_job(&self.job_id).await;

            if self.token.is_cancelled() {
                debug!(attempt, "Discarding response for cancelled session");
                break PollOutcome::Cancelled;
            }

            match result {
                Ok(raw) => {
                    failures.clear();
                    let snapshot = JobSnapshot::from_raw(&self.job_id, raw, self.vocabulary.as_ref());

                    match reconcile(&snapshot, started_at.elapsed(), self.config.missing_result) {
                        Step::Continue(update) => {
                            self.publish(logger, &update, &mut last_status);
                        }
                        Step::FetchDownload(update) => match self.api.download_link(&self.job_id).await {
                            Ok(_) if self.token.is_cancelled() => break PollOutcome::Cancelled,
                            Ok(link) => {
                                break PollOutcome::Done {
                                    url: link.url,
                                    filename: link.filename,
                                }
                            }
                            Err(e) => {
                                debug!(attempt, error = %e, "Result not downloadable yet, polling on");
                                self.publish(logger, &update, &mut last_status);
                            }
                        },
                        Step::Finish(outcome) => break outcome,
                    }
                }
                Err(e) if is_retryable(&e) => {
                    record_transient_error();
                    if failures.note_failure() {
                        logger.log_warning(&format!(
                            "status request {} failed, retrying in {:?}: {}",
                            attempt,
                            backoff.peek(),
                            e
                        ));
                    } else {
                        debug!(attempt, streak = failures.streak(), error = %e, "Status request failed");
                    }
                }
                Err(e) => {
                    break PollOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            }

            if self.token.is_cancelled() {
                break PollOutcome::Cancelled;
            }

            // Never sleep past the session deadline.
            let remaining = self.config.timeout.saturating_sub(started_at.elapsed());
            let delay = backoff.next_delay().min(remaining);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling next poll");

            let cancelled = tokio::select! {
                _ = self.token.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                break PollOutcome::Cancelled;
            }
        };

        self.finish(logger, &outcome, started_at.elapsed(), attempt);
        outcome
    }

    fn publish(&self, logger: &JobLogger, update: &PollUpdate, last_status: &mut Option<UiStatus>) {
        if *last_status != Some(update.ui_status) {
            logger.log_progress(&format!(
                "{} ({}%)",
                update.ui_status,
                (update.progress * 100.0).round()
            ));
            *last_status = Some(update.ui_status);
        }
        for observer in self.observers.iter() {
            observer.on_update(update);
        }
    }

    fn finish(&self, logger: &JobLogger, outcome: &PollOutcome, elapsed: std::time::Duration, attempts: u32) {
        record_outcome(outcome.kind(), elapsed);

        if !outcome.is_terminal() {
            debug!(attempts, "Poll session cancelled");
            return;
        }

        if !self.guard.claim(&self.job_id) {
            debug!("Terminal state already handled for this job");
            return;
        }

        match outcome {
            PollOutcome::Done { url, .. } => {
                logger.log_completion(&format!("result at {} after {} requests", url, attempts));
            }
            other => {
                logger.log_error(other.error_message().unwrap_or("unknown error"));
            }
        }

        for observer in self.observers.iter() {
            observer.on_terminal(&self.job_id, outcome);
        }
    }
}
