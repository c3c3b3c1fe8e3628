//! Progress normalization and ETA estimation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Normalize a progress value of unknown scale to a fraction in [0, 1].
///
/// Values above 1 are treated as percentages. NaN normalizes to 0.
pub fn normalize_progress(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    if raw > 1.0 {
        (raw / 100.0).min(1.0)
    } else {
        raw.max(0.0)
    }
}

/// Estimated time remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Eta {
    /// No progress yet, so nothing to extrapolate from
    Estimating,
    /// Whole seconds left
    Remaining { seconds: u64 },
}

impl Eta {
    pub fn seconds(&self) -> Option<u64> {
        match self {
            Eta::Estimating => None,
            Eta::Remaining { seconds } => Some(*seconds),
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Estimating => write!(f, "estimating..."),
            Eta::Remaining { seconds } if *seconds >= 60 => {
                write!(f, "{}m {:02}s", seconds / 60, seconds % 60)
            }
            Eta::Remaining { seconds } => write!(f, "{}s", seconds),
        }
    }
}

/// Estimate remaining time from elapsed time and the current fraction.
///
/// Total time is extrapolated as `elapsed / fraction`. The fraction is
/// expected to be normalized already; anything not strictly positive
/// yields [`Eta::Estimating`].
pub fn estimate_eta(elapsed: Duration, fraction: f64) -> Eta {
    if fraction.is_nan() || fraction <= 0.0 {
        return Eta::Estimating;
    }
    let elapsed_secs = elapsed.as_secs_f64();
    let total = elapsed_secs / fraction;
    let remaining = (total - elapsed_secs).round().max(0.0);
    Eta::Remaining {
        seconds: remaining as u64,
    }
}
