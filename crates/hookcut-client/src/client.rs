//! Job API HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use hookcut_models::{parse_job_id, CreateJobRequest, DownloadLink, JobId, RawJob};

use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;

/// Operations the tracker needs from a job backend.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a job for an uploaded source video.
    async fn create_job(&self, request: &CreateJobRequest) -> ClientResult<JobId>;

    /// Fetch the current state of a job.
    async fn get_job(&self, job_id: &JobId) -> ClientResult<RawJob>;

    /// Resolve a signed download URL for a finished job.
    async fn download_link(&self, job_id: &JobId) -> ClientResult<DownloadLink>;
}

/// Configuration for the job API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            api_token: None,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("HOOKCUT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("HOOKCUT_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(10),
            api_token: std::env::var("HOOKCUT_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Client for the job API.
#[derive(Debug, Clone)]
pub struct JobApiClient {
    http: Client,
    /// Same settings, but never follows redirects (download endpoint)
    no_redirect: Client,
    config: ClientConfig,
}

impl JobApiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base URL is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        let no_redirect = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            no_redirect,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn job_url(&self, job_id: &JobId, suffix: &str) -> String {
        self.url(&format!(
            "/api/jobs/{}{}",
            urlencoding::encode(job_id.as_str()),
            suffix
        ))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ClientResult<Response> {
        let start = Instant::now();
        let result = self.authorize(request).send().await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(response) => {
                record_request(operation, response.status().as_u16(), latency_ms);
                Ok(response)
            }
            Err(e) => {
                record_request(operation, 0, latency_ms);
                Err(ClientError::Network(e))
            }
        }
    }

    async fn error_for(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::from_http_status(status, body)
    }
}

#[async_trait]
impl JobApi for JobApiClient {
    async fn create_job(&self, request: &CreateJobRequest) -> ClientResult<JobId> {
        let url = self.url("/api/jobs");
        debug!(uid = %request.uid, storage_path = %request.storage_path, "Creating job");

        let response = self
            .send("create_job", self.http.post(&url).json(request))
            .await?;

        if !response.status().is_success() {
            let err = Self::error_for(response).await;
            warn!("Create job failed: {}", err);
            return Err(err);
        }

        let body: Value = response.json().await?;
        parse_job_id(&body).ok_or(ClientError::MissingJobId)
    }

    async fn get_job(&self, job_id: &JobId) -> ClientResult<RawJob> {
        let url = self.job_url(job_id, "");

        let response = self.send("get_job", self.http.get(&url)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: Value = response.json().await?;
        RawJob::from_response(&body)
            .ok_or_else(|| ClientError::invalid_response("job status is not a JSON object"))
    }

    async fn download_link(&self, job_id: &JobId) -> ClientResult<DownloadLink> {
        let url = self.job_url(job_id, "/download");

        let response = self
            .send("download_link", self.no_redirect.get(&url))
            .await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| ClientError::invalid_response("redirect without Location header"))?;
            return Ok(DownloadLink {
                url: location,
                filename: None,
            });
        }

        if !status.is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: Value = response.json().await?;
        let url = ["url", "downloadUrl", "signedUrl"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClientError::invalid_response("download response has no url"))?;

        Ok(DownloadLink {
            url: url.to_string(),
            filename: body
                .get("filename")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}
