//! Shared primitives for all Rust crates in authsweep.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across authsweep crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input, configuration or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// The directory provider rejected a request as malformed or oversized.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation conflicts with existing process state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The directory provider refused the supplied credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_keeps_value_untrimmed() {
        let value = NonEmptyString::new(" alice@example.com");
        assert_eq!(
            value.map(String::from).ok().as_deref(),
            Some(" alice@example.com")
        );
    }

    #[test]
    fn invalid_argument_display_names_category() {
        let error = AppError::InvalidArgument("too many uids".to_owned());
        assert_eq!(error.to_string(), "invalid argument: too many uids");
    }
}
