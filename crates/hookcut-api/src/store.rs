//! Job persistence for the development server.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use hookcut_models::{Job, JobId, JobPhase};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    AlreadyExists(JobId),

    #[error("job {0} not found")]
    Missing(JobId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where jobs live between requests.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails if the id is taken.
    async fn create(&self, job: Job) -> StoreResult<()>;

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Replace an existing job.
    async fn save(&self, job: Job) -> StoreResult<()>;

    /// Move up to `limit` queued jobs to `analyzing` and return them,
    /// oldest first. A claimed job is never handed out twice.
    async fn claim_queued(&self, limit: usize) -> StoreResult<Vec<Job>>;

    async fn count(&self) -> usize;
}

/// Jobs kept in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: Job) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn save(&self, job: Job) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(StoreError::Missing(job.id)),
        }
    }

    async fn claim_queued(&self, limit: usize) -> StoreResult<Vec<Job>> {
        let mut jobs = self.jobs.write().await;

        let mut queued: Vec<&mut Job> = jobs
            .values_mut()
            .filter(|job| job.status == JobPhase::Queued)
            .collect();
        queued.sort_by_key(|job| job.created_at);

        Ok(queued
            .into_iter()
            .take(limit)
            .map(|job| {
                job.advance(JobPhase::Analyzing, 0.0);
                job.clone()
            })
            .collect())
    }

    async fn count(&self) -> usize {
        self.jobs.read().await.len()
    }
}
