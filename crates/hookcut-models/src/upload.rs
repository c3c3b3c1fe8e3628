//! Upload constraints for source videos.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 2 GiB, the larger of the caps seen across upload paths.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

const DEFAULT_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-matroska",
    "video/x-msvideo",
];

const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,
}

/// Metadata of a file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFile {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

impl VideoFile {
    /// Build metadata, guessing the content type from the extension.
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        let filename = filename.into();
        let content_type = extension_of(&filename)
            .and_then(|ext| content_type_for_extension(&ext))
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            filename,
            content_type,
            size,
        }
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.filename)
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type for a known video extension.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    EXTENSION_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
}

/// Which files may be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConstraints {
    pub max_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_content_types: DEFAULT_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            allowed_extensions: EXTENSION_TYPES.iter().map(|(e, _)| e.to_string()).collect(),
        }
    }
}

impl UploadConstraints {
    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// A file passes when either its content type or its extension is allowed,
    /// and its size is within the cap.
    pub fn validate(&self, file: &VideoFile) -> Result<(), UploadError> {
        let type_ok = self
            .allowed_content_types
            .iter()
            .any(|ct| ct.eq_ignore_ascii_case(file.content_type.trim()));
        let ext_ok = file
            .extension()
            .map(|ext| self.allowed_extensions.iter().any(|e| *e == ext))
            .unwrap_or(false);

        if !type_ok && !ext_ok {
            return Err(UploadError::UnsupportedType(format!(
                "{} ({})",
                file.filename, file.content_type
            )));
        }
        if file.size == 0 {
            return Err(UploadError::Empty);
        }
        if file.size > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                size: file.size,
                max: self.max_size_bytes,
            });
        }
        Ok(())
    }
}
