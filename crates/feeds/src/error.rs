//! Error types for fetch operations.

use std::time::Duration;
use thiserror::Error;

/// Longest response body kept in an error, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors that can occur while fetching one data source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Malformed JSON from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("All sources failed: {0}")]
    AllFailed(String),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub(crate) fn missing(path: &[&str]) -> Self {
        FetchError::MissingField(path.join("."))
    }

    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Minimum delay before retrying, if the error is retryable at all.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FetchError::Status { status: 429, .. } => Some(Duration::from_secs(5)),
            e if e.is_transient() => Some(Duration::ZERO),
            _ => None,
        }
    }
}

/// Truncate a response body for inclusion in logs and errors.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
