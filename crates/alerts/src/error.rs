//! Delivery error types.

use thiserror::Error;

/// Longest response body kept in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Refusing to deliver an empty message")]
    EmptyMessage,

    #[error("Invalid delivery configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error sending to {endpoint}: {reason}")]
    Network { endpoint: String, reason: String },

    #[error("{endpoint} rejected message (HTTP {status}): {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl DeliveryError {
    /// Whether the endpoint answered at all.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Trim `body` to `max_chars` characters, marking the cut.
pub(crate) fn truncate_body(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = DeliveryError::Rejected {
            endpoint: "https://api.telegram.org/bot<redacted>/sendMessage".to_string(),
            status: 400,
            body: "Bad Request: chat not found".to_string(),
        };
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "https://api.telegram.org/bot<redacted>/sendMessage rejected message (HTTP 400): Bad Request: chat not found"
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("abc", 10), "abc");
        assert_eq!(truncate_body(&"x".repeat(600), MAX_ERROR_BODY_CHARS).chars().count(), 513);
    }
}
