//! Application state.

use std::sync::Arc;

use hookcut_models::UploadConstraints;

use crate::config::ApiConfig;
use crate::store::{InMemoryJobStore, JobStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: Arc<dyn JobStore>,
    pub constraints: UploadConstraints,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryJobStore::new()))
    }

    pub fn with_store(config: ApiConfig, jobs: Arc<dyn JobStore>) -> Self {
        let constraints = UploadConstraints::default().with_max_size(config.max_upload_bytes);
        Self {
            config,
            jobs,
            constraints,
        }
    }
}
