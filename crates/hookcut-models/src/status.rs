//! Status vocabulary mapping.
//!
//! The job backend and its older proxies disagree on a status vocabulary
//! (`queued|analyzing|hook|...|done|error` vs `UPLOADING|PROCESSING|DONE|FAILED`).
//! Everything that reaches the UI goes through this module first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status values surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UiStatus {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Source video is being uploaded
    Uploading,
    /// Backend is analyzing the source
    Analyzing,
    /// Hook selection
    Hook,
    /// Cutting
    Cutting,
    /// Pacing
    Pacing,
    /// Rendering the edit
    Rendering,
    /// Uploading the rendered result
    UploadingResult,
    /// Finished successfully
    Done,
    /// Finished with an error
    Error,
}

impl UiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiStatus::Idle => "idle",
            UiStatus::Uploading => "uploading",
            UiStatus::Analyzing => "analyzing",
            UiStatus::Hook => "hook",
            UiStatus::Cutting => "cutting",
            UiStatus::Pacing => "pacing",
            UiStatus::Rendering => "rendering",
            UiStatus::UploadingResult => "uploading_result",
            UiStatus::Done => "done",
            UiStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UiStatus::Done | UiStatus::Error)
    }
}

impl fmt::Display for UiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal classification of a raw status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Job finished successfully
    Done,
    /// Job finished with an error
    Failed,
    /// Job is still in flight
    Active,
}

impl StatusClass {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusClass::Active)
    }
}

const DONE_SYNONYMS: &[&str] = &["done", "complete", "completed", "succeeded", "success"];
const FAILED_SYNONYMS: &[&str] = &["error", "failed", "failure"];

/// Classify a raw backend status, independent of the mapping table.
pub fn classify(raw: &str) -> StatusClass {
    let key = raw.trim().to_ascii_lowercase();
    if DONE_SYNONYMS.contains(&key.as_str()) {
        StatusClass::Done
    } else if FAILED_SYNONYMS.contains(&key.as_str()) {
        StatusClass::Failed
    } else {
        StatusClass::Active
    }
}

/// Map a raw backend status to a UI status.
///
/// Terminal synonyms are checked first via [`classify`]. Unknown values
/// fall back to [`UiStatus::Analyzing`]: an unfamiliar string means the
/// backend is still working on something.
pub fn map_status(raw: &str) -> UiStatus {
    match classify(raw) {
        StatusClass::Done => return UiStatus::Done,
        StatusClass::Failed => return UiStatus::Error,
        StatusClass::Active => {}
    }

    match raw.trim().to_ascii_lowercase().as_str() {
        "idle" => UiStatus::Idle,
        "uploading" => UiStatus::Uploading,
        "queued" | "pending" | "processing" | "analyzing" => UiStatus::Analyzing,
        "hook" | "hooks" => UiStatus::Hook,
        "cutting" | "cut" => UiStatus::Cutting,
        "pacing" => UiStatus::Pacing,
        "rendering" | "render" => UiStatus::Rendering,
        "uploading_result" | "finalizing" => UiStatus::UploadingResult,
        _ => UiStatus::Analyzing,
    }
}

/// A pluggable status vocabulary.
///
/// The poller consults this for every response, so a caller talking to a
/// backend with a different vocabulary can supply its own table.
pub trait StatusVocabulary: Send + Sync {
    /// Terminal classification. Checked before [`StatusVocabulary::map`].
    fn classify(&self, raw: &str) -> StatusClass;

    /// Map a non-terminal raw status to a UI status.
    fn map(&self, raw: &str) -> UiStatus;
}

/// The built-in vocabulary table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVocabulary;

impl StatusVocabulary for DefaultVocabulary {
    fn classify(&self, raw: &str) -> StatusClass {
        classify(raw)
    }

    fn map(&self, raw: &str) -> UiStatus {
        map_status(raw)
    }
}
