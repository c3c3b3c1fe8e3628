//! Background worker that stands in for the render pipeline.
//!
//! It scans the store for queued jobs and walks each one through the
//! fixed phase sequence, sleeping `step_delay` per phase, then publishes a
//! result URL. No video is actually processed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hookcut_models::{Job, JobPhase, JobResult};

use crate::config::WorkerConfig;
use crate::metrics;
use crate::store::{JobStore, StoreResult};

/// Phases every job passes through, with the progress reported in each.
pub const RENDER_STEPS: [(JobPhase, f64); 5] = [
    (JobPhase::Analyzing, 0.1),
    (JobPhase::Hook, 0.3),
    (JobPhase::Cutting, 0.5),
    (JobPhase::Pacing, 0.7),
    (JobPhase::Rendering, 0.9),
];

/// Storage paths containing this marker fail at the rendering step.
const FAILURE_MARKER: &str = "fail";
const FAILURE_CODE: &str = "render_failed";
const FAILURE_MESSAGE: &str = "render failed";

/// `tokio::time::interval` rejects a zero period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Simulated render worker.
#[derive(Clone)]
pub struct SimulatedWorker {
    jobs: Arc<dyn JobStore>,
    config: WorkerConfig,
    active: Arc<AtomicUsize>,
}

impl SimulatedWorker {
    pub fn new(jobs: Arc<dyn JobStore>, config: WorkerConfig) -> Self {
        Self {
            jobs,
            config,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Jobs currently being processed.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Scan for queued jobs until `shutdown` fires.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self, shutdown: CancellationToken) {
        if !self.config.enabled {
            info!("Simulated worker is disabled");
            return;
        }

        info!(
            "Starting simulated worker (interval: {:?}, step delay: {:?}, batch: {})",
            self.config.poll_interval, self.config.step_delay, self.config.batch_limit
        );

        let mut ticker = interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Simulated worker stopping");
                    return;
                }
                _ = ticker.tick() => {}
            }

            match self.scan_once().await {
                Ok(claimed) if !claimed.is_empty() => {
                    debug!("Claimed {} queued jobs", claimed.len());
                    for job in claimed {
                        let worker = self.clone();
                        let token = shutdown.clone();
                        tokio::spawn(async move {
                            worker.process(job, token).await;
                        });
                    }
                }
                Ok(_) => {}
                Err(e) => error!("Simulated worker scan error: {}", e),
            }
        }
    }

    /// Claim up to `batch_limit` queued jobs.
    pub async fn scan_once(&self) -> StoreResult<Vec<Job>> {
        self.jobs.claim_queued(self.config.batch_limit).await
    }

    /// Walk one claimed job to a terminal phase.
    pub async fn process(&self, mut job: Job, shutdown: CancellationToken) {
        let count = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_jobs(count);

        let result = self.run_steps(&mut job, &shutdown).await;
        if let Err(e) = result {
            error!(job_id = %job.id, "Failed to update job: {}", e);
        }

        let count = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_jobs(count);
    }

    async fn run_steps(&self, job: &mut Job, shutdown: &CancellationToken) -> StoreResult<()> {
        let should_fail = job.storage_path.contains(FAILURE_MARKER);

        for (phase, progress) in RENDER_STEPS {
            job.advance(phase, progress);
            self.jobs.save(job.clone()).await?;
            debug!(job_id = %job.id, phase = %phase, progress, "Job advanced");

            if phase == JobPhase::Rendering && should_fail {
                job.fail(FAILURE_CODE, FAILURE_MESSAGE);
                self.jobs.save(job.clone()).await?;
                metrics::record_job_failed(FAILURE_CODE);
                warn!(job_id = %job.id, "Job failed: {}", FAILURE_MESSAGE);
                return Ok(());
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    // Left mid-phase; a restarted server starts from an empty store anyway
                    debug!(job_id = %job.id, "Worker shut down during {}", phase);
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.step_delay) => {}
            }
        }

        let filename = format!("{}-edited.mp4", job.id);
        job.complete(JobResult {
            video_url: format!("{}/{}", self.config.result_base_url, filename),
            filename: Some(filename),
        });
        self.jobs.save(job.clone()).await?;
        metrics::record_job_completed();
        info!(job_id = %job.id, "Job completed");

        Ok(())
    }
}
