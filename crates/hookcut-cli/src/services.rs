//! Process-wide service handles, built once in `main`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use hookcut_client::{ClientConfig, JobApi, JobApiClient};
use hookcut_storage::{LocalStore, ObjectStore, R2Client, R2Config};
use hookcut_tracker::PollerConfig;

/// Which object store uploads go to.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageChoice {
    /// S3-compatible bucket from the `R2_*` variables
    R2,
    /// A local directory, for use with the dev server
    Local(PathBuf),
    None,
}

impl StorageChoice {
    /// `HOOKCUT_LOCAL_STORE` wins over R2, R2 needs its endpoint set.
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var("HOOKCUT_LOCAL_STORE")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            return StorageChoice::Local(PathBuf::from(dir));
        }
        if std::env::var("R2_ENDPOINT_URL").is_ok() {
            return StorageChoice::R2;
        }
        StorageChoice::None
    }
}

/// Shared handles passed by reference to every command.
pub struct Services {
    pub api: Arc<dyn JobApi>,
    pub storage: Option<Arc<dyn ObjectStore>>,
    pub poller: PollerConfig,
}

impl Services {
    pub fn from_env() -> anyhow::Result<Self> {
        let client_config = ClientConfig::from_env();
        info!("Job API at {}", client_config.base_url);
        let api = JobApiClient::new(client_config).context("Failed to create job API client")?;

        let storage: Option<Arc<dyn ObjectStore>> = match StorageChoice::from_env() {
            StorageChoice::R2 => {
                let config = R2Config::from_env().context("Incomplete R2 configuration")?;
                debug!(bucket = %config.bucket_name, "Uploading to R2");
                Some(Arc::new(R2Client::new(config)))
            }
            StorageChoice::Local(dir) => {
                debug!(dir = %dir.display(), "Uploading to local directory");
                Some(Arc::new(LocalStore::new(dir)))
            }
            StorageChoice::None => None,
        };

        Ok(Self {
            api: Arc::new(api),
            storage,
            poller: PollerConfig::from_env(),
        })
    }

    pub fn storage(&self) -> anyhow::Result<Arc<dyn ObjectStore>> {
        self.storage.clone().ok_or_else(|| {
            anyhow::anyhow!("No object storage configured (set HOOKCUT_LOCAL_STORE or R2_*)")
        })
    }
}
