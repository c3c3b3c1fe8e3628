//! Tests for the job API client against a mock server.

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hookcut_models::{CreateJobRequest, JobId};

use crate::client::{ClientConfig, JobApi, JobApiClient};
use crate::error::ClientError;

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> JobApiClient {
    JobApiClient::new(ClientConfig::default().with_base_url(server.uri())).unwrap()
}

fn sample_request() -> CreateJobRequest {
    CreateJobRequest {
        uid: "user-1".into(),
        storage_path: "uploads/user-1/abc-clip.mp4".into(),
        filename: "clip.mp4".into(),
        content_type: "video/mp4".into(),
        size: 4096,
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(
        ClientError::from_http_status(404, ""),
        ClientError::NotFound(_)
    ));
    assert!(matches!(
        ClientError::from_http_status(429, ""),
        ClientError::RateLimited
    ));
    assert!(matches!(
        ClientError::from_http_status(503, ""),
        ClientError::Server(503, _)
    ));
    assert!(matches!(
        ClientError::from_http_status(400, ""),
        ClientError::RequestFailed(400, _)
    ));
}

#[test]
fn test_transient_classification() {
    assert!(ClientError::from_http_status(404, "").is_transient());
    assert!(ClientError::from_http_status(429, "").is_transient());
    assert!(ClientError::from_http_status(500, "").is_transient());
    assert!(!ClientError::from_http_status(400, "").is_transient());
    assert!(!ClientError::from_http_status(403, "").is_transient());
    assert!(!ClientError::MissingJobId.is_transient());
}

#[test]
fn test_http_status_getter() {
    assert_eq!(ClientError::RateLimited.http_status(), Some(429));
    assert_eq!(ClientError::Server(502, "x".into()).http_status(), Some(502));
    assert_eq!(ClientError::MissingJobId.http_status(), None);
}

// =============================================================================
// Create Job
// =============================================================================

#[tokio::test]
async fn test_create_job_reads_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .and(body_json(json!({
            "uid": "user-1",
            "storagePath": "uploads/user-1/abc-clip.mp4",
            "filename": "clip.mp4",
            "contentType": "video/mp4",
            "size": 4096
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"jobId": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = client_for(&server).create_job(&sample_request()).await.unwrap();
    assert_eq!(job_id, JobId::from_string("abc123"));
}

#[tokio::test]
async fn test_create_job_nested_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {"id": "nested-1"}})))
        .mount(&server)
        .await;

    let job_id = client_for(&server).create_job(&sample_request()).await.unwrap();
    assert_eq!(job_id.as_str(), "nested-1");
}

#[tokio::test]
async fn test_create_job_missing_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_job(&sample_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingJobId));
}

#[tokio::test]
async fn test_create_job_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad storage path"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_job(&sample_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RequestFailed(400, ref body) if body == "bad storage path"));
}

// =============================================================================
// Get Job
// =============================================================================

#[tokio::test]
async fn test_get_job_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": {"id": "abc123", "status": "analyzing", "progress": 0.1}
        })))
        .mount(&server)
        .await;

    let raw = client_for(&server)
        .get_job(&JobId::from_string("abc123"))
        .await
        .unwrap();
    assert_eq!(raw.status.as_deref(), Some("analyzing"));
    assert_eq!(raw.progress, Some(0.1));
}

#[tokio::test]
async fn test_get_job_404_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/later"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_job(&JobId::from_string("later"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_get_job_rejects_non_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "a", "job"])))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_job(&JobId::from_string("abc123"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

// =============================================================================
// Download
// =============================================================================

#[tokio::test]
async fn test_download_link_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://cdn.test/signed.mp4",
            "filename": "edit.mp4"
        })))
        .mount(&server)
        .await;

    let link = client_for(&server)
        .download_link(&JobId::from_string("abc123"))
        .await
        .unwrap();
    assert_eq!(link.url, "https://cdn.test/signed.mp4");
    assert_eq!(link.filename.as_deref(), Some("edit.mp4"));
}

#[tokio::test]
async fn test_download_link_redirect_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123/download"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://cdn.test/redirected.mp4"),
        )
        .mount(&server)
        .await;

    let link = client_for(&server)
        .download_link(&JobId::from_string("abc123"))
        .await
        .unwrap();
    assert_eq!(link.url, "https://cdn.test/redirected.mp4");
}

// =============================================================================
// Auth & Config
// =============================================================================

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ClientConfig::default().with_base_url(server.uri());
    config.api_token = Some("secret-token".into());
    let client = JobApiClient::new(config).unwrap();

    client.get_job(&JobId::from_string("abc123")).await.unwrap();
}

#[test]
#[serial]
fn test_config_from_env() {
    std::env::set_var("HOOKCUT_API_URL", "https://jobs.example.com");
    std::env::set_var("HOOKCUT_API_TIMEOUT_SECS", "7");
    std::env::set_var("HOOKCUT_API_TOKEN", "  ");

    let config = ClientConfig::from_env();
    assert_eq!(config.base_url, "https://jobs.example.com");
    assert_eq!(config.timeout, std::time::Duration::from_secs(7));
    assert!(config.api_token.is_none());

    std::env::remove_var("HOOKCUT_API_URL");
    std::env::remove_var("HOOKCUT_API_TIMEOUT_SECS");
    std::env::remove_var("HOOKCUT_API_TOKEN");
}
