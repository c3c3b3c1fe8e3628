//! Job handlers.
//!
//! - `POST /api/jobs` creates a queued job
//! - `GET /api/jobs/:job_id` returns `{ job }`
//! - `GET /api/jobs/:job_id/download` returns the result link once done

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use hookcut_models::{CreateJobRequest, CreateJobResponse, DownloadLink, Job, JobId, JobPhase, VideoFile};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Body of `GET /api/jobs/:job_id`.
#[derive(Debug, Serialize)]
pub struct JobEnvelope {
    pub job: Job,
}

fn validate_request(state: &AppState, request: &CreateJobRequest) -> ApiResult<()> {
    if request.uid.trim().is_empty() {
        return Err(ApiError::bad_request("uid is required"));
    }
    if request.storage_path.trim().is_empty() {
        return Err(ApiError::bad_request("storagePath is required"));
    }
    if request.storage_path.split('/').any(|segment| segment == "..") {
        return Err(ApiError::bad_request("storagePath must not contain '..'"));
    }

    let file = VideoFile {
        filename: request.filename.clone(),
        content_type: request.content_type.clone(),
        size: request.size,
    };
    state.constraints.validate(&file)?;
    Ok(())
}

/// Create a processing job for an uploaded video.
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<CreateJobResponse>)> {
    validate_request(&state, &request)?;

    let job = Job::from_request(&request);
    let job_id = job.id.clone();
    state.jobs.create(job).await?;

    metrics::record_job_created();
    info!(
        job_id = %job_id,
        uid = %request.uid,
        storage_path = %request.storage_path,
        "Job queued"
    );

    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id })))
}

/// Current state of a job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobEnvelope>> {
    let job_id = JobId::from_string(job_id);
    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", job_id)))?;

    Ok(Json(JobEnvelope { job }))
}

/// Link to the edited video.
pub async fn download_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<DownloadLink>> {
    let job_id = JobId::from_string(job_id);
    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", job_id)))?;

    match (job.status, job.result) {
        (JobPhase::Done, Some(result)) => Ok(Json(DownloadLink {
            url: result.video_url,
            filename: result.filename,
        })),
        (JobPhase::Error, _) => Err(ApiError::conflict(format!("Job {} failed", job_id))),
        (phase, _) => Err(ApiError::conflict(format!(
            "Job {} is still {}",
            job_id, phase
        ))),
    }
}
