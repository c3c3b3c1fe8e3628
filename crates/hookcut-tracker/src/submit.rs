//! Turning a local video file into a remote job id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use hookcut_client::{ClientError, JobApi};
use hookcut_models::{CreateJobRequest, JobId, UploadConstraints, UploadError, VideoFile};
use hookcut_storage::{upload_key, ObjectStore, StorageError};

use crate::metrics::record_submission;

/// Why the remote half of a submission failed.
#[derive(Debug, Error)]
pub enum CreationFailure {
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("{0}")]
    CreateJob(#[from] ClientError),
}

/// Submission errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The file was refused before anything left the machine
    #[error("{0}")]
    Rejected(#[from] UploadError),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job creation failed: {0}")]
    JobCreation(#[source] CreationFailure),
}

impl SubmitError {
    /// Rejections are the caller's to fix; retrying will not help.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmitError::Rejected(_) | SubmitError::Unreadable { .. })
    }
}

impl From<StorageError> for SubmitError {
    fn from(err: StorageError) -> Self {
        SubmitError::JobCreation(CreationFailure::Upload(err))
    }
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        SubmitError::JobCreation(CreationFailure::CreateJob(err))
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// A job that was created.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub job_id: JobId,
    pub storage_path: String,
    pub file: VideoFile,
}

/// Uploads a source video and creates the processing job.
///
/// Not idempotent: calling it twice for the same file creates two jobs,
/// and an object uploaded for a failed create request is left in place.
pub struct JobSubmitter<S: ObjectStore + ?Sized, A: JobApi + ?Sized> {
    store: Arc<S>,
    api: Arc<A>,
    constraints: UploadConstraints,
}

impl<S: ObjectStore + ?Sized, A: JobApi + ?Sized> JobSubmitter<S, A> {
    pub fn new(store: Arc<S>, api: Arc<A>) -> Self {
        Self {
            store,
            api,
            constraints: UploadConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: UploadConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn constraints(&self) -> &UploadConstraints {
        &self.constraints
    }

    /// Validate, upload and create a job for one file.
    pub async fn submit(&self, path: &Path, uid: &str) -> SubmitResult<Submission> {
        let result = self.submit_inner(path, uid).await;
        match &result {
            Ok(submission) => {
                record_submission("ok");
                info!(
                    job_id = %submission.job_id,
                    storage_path = %submission.storage_path,
                    size = submission.file.size,
                    "Job created"
                );
            }
            Err(e) if e.is_rejection() => {
                record_submission("rejected");
                warn!(path = %path.display(), error = %e, "File rejected");
            }
            Err(e) => {
                record_submission("failed");
                warn!(path = %path.display(), error = %e, "Job creation failed");
            }
        }
        result
    }

    async fn submit_inner(&self, path: &Path, uid: &str) -> SubmitResult<Submission> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| SubmitError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = VideoFile::new(filename, metadata.len());
        self.constraints.validate(&file)?;

        let key = upload_key(uid, &file.filename)?;
        let stored = self.store.put_file(path, &key, &file.content_type).await?;

        let request = CreateJobRequest {
            uid: uid.to_string(),
            storage_path: stored.key.clone(),
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
        };
        let job_id = self.api.create_job(&request).await?;

        Ok(Submission {
            job_id,
            storage_path: stored.key,
            file,
        })
    }
}
