//! End-to-end tests: submitter and poller against a live dev server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use hookcut_api::{create_router, ApiConfig, AppState, SimulatedWorker, WorkerConfig};
use hookcut_client::{ClientConfig, JobApi, JobApiClient};
use hookcut_models::UiStatus;
use hookcut_storage::LocalStore;
use hookcut_tracker::{JobSubmitter, PollOutcome, Poller, PollerConfig, WatchObserver};

struct TestServer {
    base_url: String,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn spawn_server() -> TestServer {
    let config = ApiConfig {
        worker: WorkerConfig {
            enabled: true,
            poll_interval: Duration::from_millis(10),
            step_delay: Duration::from_millis(20),
            batch_limit: 5,
            result_base_url: "https://cdn.test/results".into(),
        },
        ..ApiConfig::default()
    };
    let state = AppState::new(config.clone());
    let shutdown = CancellationToken::new();

    let worker = SimulatedWorker::new(state.jobs.clone(), config.worker.clone());
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker.run(shutdown).await });
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state, None);
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .unwrap();
        });
    }

    TestServer {
        base_url: format!("http://{}", addr),
        shutdown,
    }
}

fn poller_config() -> PollerConfig {
    PollerConfig::default()
        .with_backoff(Duration::from_millis(10), Duration::from_millis(50))
        .with_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn test_submit_and_poll_to_done() {
    let server = spawn_server().await;
    let api = Arc::new(
        JobApiClient::new(ClientConfig::default().with_base_url(&server.base_url)).unwrap(),
    );

    let src = tempfile::tempdir().unwrap();
    let bucket = tempfile::tempdir().unwrap();
    let path = src.path().join("holiday.mp4");
    std::fs::write(&path, b"not really a video").unwrap();

    let submitter = JobSubmitter::new(Arc::new(LocalStore::new(bucket.path())), api.clone());
    let submission = submitter.submit(&path, "user-1").await.unwrap();

    let (watch, state) = WatchObserver::new();
    let poller = Poller::builder(api.clone())
        .config(poller_config())
        .observer(Arc::new(watch))
        .build();

    let outcome = poller.start(submission.job_id.clone()).wait().await;

    match outcome {
        PollOutcome::Done { url, .. } => {
            assert!(url.starts_with("https://cdn.test/results/"));
            assert_eq!(state.borrow().preview_url.as_deref(), Some(url.as_str()));
        }
        other => panic!("expected done, got {:?}", other),
    }
    assert_eq!(state.borrow().status, UiStatus::Done);

    let link = api.download_link(&submission.job_id).await.unwrap();
    assert!(link.url.ends_with("-edited.mp4"));
}

#[tokio::test]
async fn test_render_failure_surfaces_backend_message() {
    let server = spawn_server().await;
    let api = Arc::new(
        JobApiClient::new(ClientConfig::default().with_base_url(&server.base_url)).unwrap(),
    );

    let src = tempfile::tempdir().unwrap();
    let bucket = tempfile::tempdir().unwrap();
    let path = src.path().join("fail.mov");
    std::fs::write(&path, b"bytes").unwrap();

    let submitter = JobSubmitter::new(Arc::new(LocalStore::new(bucket.path())), api.clone());
    let submission = submitter.submit(&path, "user-1").await.unwrap();

    let (watch, state) = WatchObserver::new();
    let poller = Poller::builder(api)
        .config(poller_config())
        .observer(Arc::new(watch))
        .build();

    let outcome = poller.start(submission.job_id).wait().await;

    assert_eq!(
        outcome,
        PollOutcome::Failed {
            message: "render failed".into()
        }
    );
    assert_eq!(state.borrow().status, UiStatus::Error);
    assert_eq!(state.borrow().error.as_deref(), Some("render failed"));
}

#[tokio::test]
async fn test_unknown_job_keeps_polling_until_timeout() {
    let server = spawn_server().await;
    let api = Arc::new(
        JobApiClient::new(ClientConfig::default().with_base_url(&server.base_url)).unwrap(),
    );

    let poller = Poller::builder(api)
        .config(poller_config().with_timeout(Duration::from_millis(300)))
        .build();

    let outcome = poller
        .start(hookcut_models::JobId::from_string("never-created"))
        .wait()
        .await;
    assert_eq!(outcome.kind(), "timed_out");
}
