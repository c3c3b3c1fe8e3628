//! Job API client error types.

use thiserror::Error;

/// Result type for job API operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur talking to the job API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error {0}: {1}")]
    Server(u16, String),

    #[error("Request failed with {0}: {1}")]
    RequestFailed(u16, String),

    #[error("Response did not contain a job id")]
    MissingJobId,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => Self::NotFound(body),
            429 => Self::RateLimited,
            500..=599 => Self::Server(status, body),
            _ => Self::RequestFailed(status, body),
        }
    }

    /// HTTP status behind this error, if there was one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound(_) => Some(404),
            ClientError::RateLimited => Some(429),
            ClientError::Server(status, _) | ClientError::RequestFailed(status, _) => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a poll should simply try again later.
    ///
    /// A 404 while polling means the job is not visible yet.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_)
                | ClientError::NotFound(_)
                | ClientError::RateLimited
                | ClientError::Server(_, _)
        )
    }
}
