//! Object store abstraction and key layout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// An object written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage path, passed to the job API as `storagePath`
    pub key: String,
    pub size: u64,
}

/// Somewhere source videos can be uploaded to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`.
    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<StoredObject>;
}

/// Build the storage key for a user's upload: `uploads/{uid}/{uuid}-{filename}`.
pub fn upload_key(uid: &str, filename: &str) -> StorageResult<String> {
    let uid = uid.trim();
    if uid.is_empty() || uid.contains('/') || uid.contains("..") {
        return Err(StorageError::invalid_key(format!("invalid uid: {:?}", uid)));
    }
    Ok(format!(
        "uploads/{}/{}-{}",
        uid,
        Uuid::new_v4(),
        sanitize_filename(filename)
    ))
}

/// Reduce a filename to `[A-Za-z0-9._-]`, dropping any directory part.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stores objects under a local directory.
///
/// Used with the development job API, which never reads the bytes back.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        _content_type: &str,
    ) -> StorageResult<StoredObject> {
        let dest = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        debug!("Stored {} at {}", path.display(), dest.display());
        Ok(StoredObject {
            key: key.to_string(),
            size,
        })
    }
}
