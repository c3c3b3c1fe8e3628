//! API integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hookcut_api::{create_router, ApiConfig, AppState};
use hookcut_models::{JobId, JobResult};

/// Helper to create a test router over a fresh in-memory store.
fn create_test_router() -> (Router, AppState) {
    let state = AppState::new(ApiConfig::default());
    (create_router(state.clone(), None), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_job(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/jobs")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn sample_job() -> Value {
    json!({
        "uid": "user-1",
        "storagePath": "uploads/user-1/abc-clip.mp4",
        "filename": "clip.mp4",
        "contentType": "video/mp4",
        "size": 4096
    })
}

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_router();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

/// Test metrics endpoint renders when a handle is supplied.
#[tokio::test]
async fn test_metrics_endpoint() {
    let state = AppState::new(ApiConfig::default());
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    let app = create_router(state, Some(handle));

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (app, _) = create_test_router();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Test security headers.
#[tokio::test]
async fn test_security_headers() {
    let (app, _) = create_test_router();

    let response = app.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();

    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
}

/// Test CORS headers.
#[tokio::test]
async fn test_cors_headers() {
    let (app, _) = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/jobs")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT
    );
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

/// Test job creation and lookup.
#[tokio::test]
async fn test_create_then_get_job() {
    let (app, _) = create_test_router();

    let response = app.clone().oneshot(post_job(sample_job())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert!(!job_id.is_empty());

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["job"]["id"], job_id.as_str());
    assert_eq!(body["job"]["status"], "queued");
    assert_eq!(body["job"]["progress"], 0.0);
    assert_eq!(body["job"]["storagePath"], "uploads/user-1/abc-clip.mp4");
}

/// Test validation failures.
#[tokio::test]
async fn test_create_job_validation() {
    let (app, _) = create_test_router();

    let mut missing_uid = sample_job();
    missing_uid["uid"] = json!("  ");
    let response = app.clone().oneshot(post_job(missing_uid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("uid"));

    let mut not_video = sample_job();
    not_video["filename"] = json!("notes.txt");
    not_video["contentType"] = json!("text/plain");
    let response = app.clone().oneshot(post_job(not_video)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut empty = sample_job();
    empty["size"] = json!(0);
    let response = app.clone().oneshot(post_job(empty)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut traversal = sample_job();
    traversal["storagePath"] = json!("uploads/../secrets");
    let response = app.oneshot(post_job(traversal)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test unknown jobs return 404 with a detail body.
#[tokio::test]
async fn test_unknown_job_not_found() {
    let (app, _) = create_test_router();

    let response = app
        .clone()
        .oneshot(get("/api/jobs/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("does-not-exist"));

    let response = app
        .oneshot(get("/api/jobs/does-not-exist/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Test the download link is only available once the job is done.
#[tokio::test]
async fn test_download_after_completion() {
    let (app, state) = create_test_router();

    let response = app.clone().oneshot(post_job(sample_job())).await.unwrap();
    let job_id = body_json(response).await["jobId"]
        .as_str()
        .unwrap()
        .to_string();
    let download_uri = format!("/api/jobs/{}/download", job_id);

    let response = app.clone().oneshot(get(&download_uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let mut job = state
        .jobs
        .get(&JobId::from_string(&job_id))
        .await
        .unwrap()
        .unwrap();
    job.complete(JobResult {
        video_url: "https://cdn.test/results/out.mp4".into(),
        filename: Some("out.mp4".into()),
    });
    state.jobs.save(job).await.unwrap();

    let response = app.oneshot(get(&download_uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["url"], "https://cdn.test/results/out.mp4");
    assert_eq!(body["filename"], "out.mp4");
}
