//! Error types for report validation and formatting.

use thiserror::Error;

/// Errors raised when a record cannot be rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("{group} record '{name}': {field} must be finite and non-negative, got {value}")]
    InvalidAmount {
        group: &'static str,
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("{group} record '{name}': {field} must be finite, got {value}")]
    InvalidPercent {
        group: &'static str,
        name: String,
        field: &'static str,
        value: f64,
    },
}

/// Result type for formatting operations.
pub type FormatResult<T> = Result<T, FormatError>;

pub(crate) fn check_amount(
    group: &'static str,
    name: &str,
    field: &'static str,
    value: f64,
) -> FormatResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FormatError::InvalidAmount {
            group,
            name: name.to_string(),
            field,
            value,
        })
    }
}

pub(crate) fn check_percent(
    group: &'static str,
    name: &str,
    field: &'static str,
    value: f64,
) -> FormatResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FormatError::InvalidPercent {
            group,
            name: name.to_string(),
            field,
            value,
        })
    }
}
