//! Poller configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do when the backend reports done but no result URL yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingResultPolicy {
    /// Treat it as still in flight until a URL shows up
    #[default]
    KeepPolling,
    /// Finish by asking the download endpoint for a URL
    FetchDownload,
}

impl FromStr for MissingResultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_polling" | "keep-polling" | "poll" => Ok(Self::KeepPolling),
            "fetch_download" | "fetch-download" | "download" => Ok(Self::FetchDownload),
            other => Err(format!("unknown missing-result policy: {}", other)),
        }
    }
}

impl fmt::Display for MissingResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepPolling => write!(f, "keep_polling"),
            Self::FetchDownload => write!(f, "fetch_download"),
        }
    }
}

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay after the first response
    pub initial_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
    /// Wall-clock ceiling for a whole poll session
    pub timeout: Duration,
    pub missing_result: MissingResultPolicy,
    /// Consecutive transient failures logged before going quiet
    pub max_logged_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(10),
            timeout: Duration::from_secs(600), // 10 minutes
            missing_result: MissingResultPolicy::KeepPolling,
            max_logged_failures: 3,
        }
    }
}

impl PollerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_backoff: Duration::from_millis(
                std::env::var("HOOKCUT_POLL_INITIAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or(1000),
            ),
            max_backoff: Duration::from_millis(
                std::env::var("HOOKCUT_POLL_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or(10_000),
            ),
            timeout: Duration::from_secs(
                std::env::var("HOOKCUT_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or(600),
            ),
            missing_result: std::env::var("HOOKCUT_POLL_MISSING_RESULT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.missing_result),
            max_logged_failures: defaults.max_logged_failures,
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_missing_result(mut self, policy: MissingResultPolicy) -> Self {
        self.missing_result = policy;
        self
    }
}
