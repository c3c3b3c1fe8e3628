//! Command handlers.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use hookcut_models::{JobId, UiStatus};
use hookcut_tracker::{JobSubmitter, LogObserver, PollOutcome, Poller, UiState, WatchObserver};

use crate::services::Services;

/// Process exit status for a finished poll session.
pub fn exit_code(outcome: &PollOutcome) -> u8 {
    match outcome {
        PollOutcome::Done { .. } => 0,
        PollOutcome::Failed { .. } => 1,
        PollOutcome::TimedOut { .. } => 2,
        PollOutcome::Cancelled => 130,
    }
}

/// One console line for a UI state.
pub fn status_line(state: &UiState) -> String {
    match state.status {
        UiStatus::Done => match &state.preview_url {
            Some(url) => format!("done: {}", url),
            None => "done".to_string(),
        },
        UiStatus::Error => format!(
            "error: {}",
            state.error.as_deref().unwrap_or("unknown error")
        ),
        status => match &state.eta {
            Some(eta) => format!("{:<16} {:>3}%  eta {}", status.as_str(), state.percent(), eta),
            None => format!("{:<16} {:>3}%", status.as_str(), state.percent()),
        },
    }
}

/// Print a line each time the rendered status changes.
async fn render(mut rx: watch::Receiver<UiState>) {
    let mut last = String::new();
    while rx.changed().await.is_ok() {
        let line = status_line(&rx.borrow_and_update());
        if line != last {
            println!("{}", line);
            last = line;
        }
    }
}

/// `hookcut submit`
pub async fn submit(services: &Services, file: &Path, uid: &str, watch: bool) -> anyhow::Result<ExitCode> {
    let submitter = JobSubmitter::new(services.storage()?, Arc::clone(&services.api));

    println!("uploading {}", file.display());
    let submission = submitter
        .submit(file, uid)
        .await
        .with_context(|| format!("Could not submit {}", file.display()))?;

    println!("job {}", submission.job_id);
    if !watch {
        return Ok(ExitCode::SUCCESS);
    }
    follow(services, submission.job_id).await
}

/// `hookcut watch`
pub async fn follow(services: &Services, job_id: JobId) -> anyhow::Result<ExitCode> {
    let (observer, rx) = WatchObserver::new();
    let poller = Poller::builder(Arc::clone(&services.api))
        .config(services.poller.clone())
        .observer(Arc::new(observer))
        .observer(Arc::new(LogObserver::new()))
        .build();

    let printer = tokio::spawn(render(rx));
    let handle = poller.start(job_id);

    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for CTRL+C: {}", e);
            }
            info!(job_id = %handle.job_id(), "Interrupted, stopping poll session");
            handle.cancel();
            handle.wait().await
        }
    };

    // Dropping the poller closes the watch channel, which ends the printer
    drop(poller);
    printer.await.ok();

    if let PollOutcome::TimedOut { .. } = outcome {
        eprintln!(
            "gave up after {:?}; the job may still finish, run `hookcut watch {}` later",
            services.poller.timeout,
            handle.job_id()
        );
    }
    Ok(ExitCode::from(exit_code(&outcome)))
}

/// `hookcut download`
pub async fn download(services: &Services, job_id: JobId) -> anyhow::Result<ExitCode> {
    let link = services
        .api
        .download_link(&job_id)
        .await
        .with_context(|| format!("No download available for job {}", job_id))?;

    match link.filename {
        Some(filename) => println!("{}\t{}", link.url, filename),
        None => println!("{}", link.url),
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hookcut_models::Eta;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code(&PollOutcome::Done {
                url: "u".into(),
                filename: None
            }),
            0
        );
        assert_eq!(exit_code(&PollOutcome::Failed { message: "x".into() }), 1);
        assert_eq!(
            exit_code(&PollOutcome::TimedOut {
                elapsed: Duration::from_secs(600)
            }),
            2
        );
        assert_eq!(exit_code(&PollOutcome::Cancelled), 130);
    }

    #[test]
    fn test_status_line() {
        let state = UiState {
            status: UiStatus::Cutting,
            progress: 0.5,
            eta: Some(Eta::Remaining { seconds: 65 }),
            ..UiState::default()
        };
        assert_eq!(status_line(&state), "cutting           50%  eta 1m 05s");

        let state = UiState {
            status: UiStatus::Error,
            error: Some("render failed".into()),
            ..UiState::default()
        };
        assert_eq!(status_line(&state), "error: render failed");

        let state = UiState {
            status: UiStatus::Done,
            progress: 1.0,
            preview_url: Some("https://x/y.mp4".into()),
            ..UiState::default()
        };
        assert_eq!(status_line(&state), "done: https://x/y.mp4");
    }
}
