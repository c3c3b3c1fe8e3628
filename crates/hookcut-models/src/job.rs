//! Job definitions shared by the client, the tracker and the dev server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::progress::normalize_progress;
use crate::status::{StatusClass, StatusVocabulary, UiStatus};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phases a job moves through on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    #[default]
    Queued,
    Analyzing,
    Hook,
    Cutting,
    Pacing,
    Rendering,
    Uploading,
    Done,
    Error,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Queued => "queued",
            JobPhase::Analyzing => "analyzing",
            JobPhase::Hook => "hook",
            JobPhase::Cutting => "cutting",
            JobPhase::Pacing => "pacing",
            JobPhase::Rendering => "rendering",
            JobPhase::Uploading => "uploading",
            JobPhase::Done => "done",
            JobPhase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Error)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Playable URL of the edited video
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Error reported by the backend for a failed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A job document as stored by the job backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub uid: String,
    pub storage_path: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub status: JobPhase,
    /// Fraction in [0, 1]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job from a create request.
    pub fn from_request(request: &CreateJobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            uid: request.uid.clone(),
            storage_path: request.storage_path.clone(),
            filename: request.filename.clone(),
            content_type: request.content_type.clone(),
            size: request.size,
            status: JobPhase::Queued,
            progress: 0.0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a non-terminal phase.
    pub fn advance(&mut self, phase: JobPhase, progress: f64) {
        self.status = phase;
        self.progress = normalize_progress(progress);
        self.updated_at = Utc::now();
    }

    /// Mark job as done.
    pub fn complete(&mut self, result: JobResult) {
        self.status = JobPhase::Done;
        self.progress = 1.0;
        self.result = Some(result);
        self.updated_at = Utc::now();
    }

    /// Mark job as failed.
    pub fn fail(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.status = JobPhase::Error;
        self.error = Some(JobFailure {
            code: Some(code.into()),
            message: Some(message.into()),
        });
        self.updated_at = Utc::now();
    }
}

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub uid: String,
    pub storage_path: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

/// Body returned by `POST /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

/// Extract the job id from a create-job response.
///
/// Integration points answer with `jobId`, `id` or `job.id`.
pub fn parse_job_id(body: &Value) -> Option<JobId> {
    let candidates = [
        body.get("jobId"),
        body.get("id"),
        body.get("job").and_then(|job| job.get("id")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(JobId::from_string(s.trim())),
            Value::Number(n) => Some(JobId::from_string(n.to_string())),
            _ => None,
        })
}

/// Download link for a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A leniently parsed job status document.
///
/// Field names drift between backends, so this is read from a JSON value
/// rather than derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawJob {
    pub id: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub result_url: Option<String>,
    pub result_filename: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl RawJob {
    /// Parse a status response, unwrapping an optional `{ "job": ... }` envelope.
    pub fn from_response(body: &Value) -> Option<Self> {
        let job = match body.get("job") {
            Some(inner @ Value::Object(_)) => inner,
            _ => body,
        };
        Self::from_value(job)
    }

    /// Parse a bare job object.
    pub fn from_value(job: &Value) -> Option<Self> {
        let obj = job.as_object()?;

        let id = obj.get("id").and_then(value_as_string);
        let status = [obj.get("status"), obj.get("phase")]
            .into_iter()
            .flatten()
            .find_map(non_empty_str);
        let progress = obj.get("progress").and_then(value_as_f64);

        let result = obj.get("result");
        let result_url = [
            result.and_then(|r| r.get("videoUrl")),
            result.and_then(|r| r.get("url")),
            obj.get("resultUrl"),
            obj.get("outputUrl"),
        ]
        .into_iter()
        .flatten()
        .find_map(non_empty_str);
        let result_filename = result
            .and_then(|r| r.get("filename"))
            .and_then(non_empty_str);

        let (error_code, error_message) = match obj.get("error") {
            Some(Value::Object(err)) => (
                err.get("code").and_then(value_as_string),
                err.get("message").and_then(non_empty_str),
            ),
            Some(Value::String(msg)) if !msg.trim().is_empty() => (None, Some(msg.clone())),
            _ => (None, None),
        };
        let error_message =
            error_message.or_else(|| obj.get("errorMessage").and_then(non_empty_str));

        Some(Self {
            id,
            status,
            progress,
            result_url,
            result_filename,
            error_code,
            error_message,
        })
    }
}

fn non_empty_str(v: &Value) -> Option<String> {
    v.as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

/// Normalized client-side projection of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: JobId,
    /// Status string exactly as the backend sent it
    pub raw_status: String,
    pub class: StatusClass,
    pub ui_status: UiStatus,
    /// Always in [0, 1]
    pub progress: f64,
    pub result: Option<JobResult>,
    pub error: Option<JobFailure>,
}

impl JobSnapshot {
    /// Normalize a raw job through a vocabulary.
    pub fn from_raw(id: &JobId, raw: RawJob, vocabulary: &dyn StatusVocabulary) -> Self {
        let raw_status = raw.status.unwrap_or_default();
        let class = vocabulary.classify(&raw_status);
        let ui_status = match class {
            StatusClass::Done => UiStatus::Done,
            StatusClass::Failed => UiStatus::Error,
            StatusClass::Active => vocabulary.map(&raw_status),
        };
        let progress = raw.progress.map(normalize_progress).unwrap_or(0.0);

        let result = raw.result_url.map(|video_url| JobResult {
            video_url,
            filename: raw.result_filename,
        });
        let error = if raw.error_code.is_some() || raw.error_message.is_some() {
            Some(JobFailure {
                code: raw.error_code,
                message: raw.error_message,
            })
        } else {
            None
        };

        Self {
            id: raw.id.map(JobId::from_string).unwrap_or_else(|| id.clone()),
            raw_status,
            class,
            ui_status,
            progress,
            result,
            error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class.is_terminal()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.video_url.as_str())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }
}
