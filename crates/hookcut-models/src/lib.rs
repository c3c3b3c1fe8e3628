//! Shared data models for HookCut.
//!
//! This crate provides:
//! - Job documents, create requests and the lenient status projection
//! - Status vocabulary mapping and terminal classification
//! - Progress normalization and ETA estimation
//! - Upload constraints for source videos

pub mod job;
pub mod progress;
pub mod status;
pub mod upload;

// Re-export common types
pub use job::{
    parse_job_id, CreateJobRequest, CreateJobResponse, DownloadLink, Job, JobFailure, JobId,
    JobPhase, JobResult, JobSnapshot, RawJob,
};
pub use progress::{estimate_eta, normalize_progress, Eta};
pub use status::{classify, map_status, DefaultVocabulary, StatusClass, StatusVocabulary, UiStatus};
pub use upload::{
    content_type_for_extension, UploadConstraints, UploadError, VideoFile, DEFAULT_MAX_UPLOAD_BYTES,
};
