//! # Provider Errors
//!
//! Error types for upstream ride provider calls.
//!
//! # Examples
//!
//! ```
//! use fare_compare::infrastructure::providers::error::ProviderError;
//! use fare_compare::domain::entities::FailureKind;
//!
//! let error = ProviderError::timeout_with_duration("no answer", 5000);
//! assert_eq!(error.kind(), FailureKind::Timeout);
//! assert_eq!(error.timeout_ms(), Some(5000));
//! ```

use crate::domain::entities::{FailureKind, ProviderFailure};
use thiserror::Error;

/// Error type for provider operations.
///
/// Every failure a provider can produce maps to one of four kinds; the
/// aggregator records the kind and message per provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider did not answer in time.
    #[error("provider timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// The response could not be decoded into a quote.
    #[error("provider parse failure: {message}")]
    ParseFailure {
        /// Error message.
        message: String,
    },

    /// The provider refused the request.
    #[error("provider rejected request: {message}")]
    UpstreamRejected {
        /// Error message.
        message: String,
        /// HTTP status returned by the provider, if any.
        status: Option<u16>,
    },

    /// Unknown or unclassified error.
    #[error("provider unknown error: {message}")]
    Unknown {
        /// Error message.
        message: String,
    },
}

impl ProviderError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with the elapsed budget.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a parse failure.
    #[must_use]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    /// Creates an upstream rejection.
    #[must_use]
    pub fn upstream_rejected(message: impl Into<String>) -> Self {
        Self::UpstreamRejected {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an upstream rejection carrying the HTTP status.
    #[must_use]
    pub fn upstream_rejected_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::UpstreamRejected {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates an unknown error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::ParseFailure { .. } => FailureKind::ParseFailure,
            Self::UpstreamRejected { .. } => FailureKind::UpstreamRejected,
            Self::Unknown { .. } => FailureKind::Unknown,
        }
    }

    /// Returns the error message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Timeout { message, .. }
            | Self::ParseFailure { message }
            | Self::UpstreamRejected { message, .. }
            | Self::Unknown { message } => message,
        }
    }

    /// Returns the elapsed timeout, if applicable.
    #[must_use]
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Timeout { timeout_ms, .. } => *timeout_ms,
            _ => None,
        }
    }

    /// Returns the upstream HTTP status, if applicable.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamRejected { status, .. } => *status,
            _ => None,
        }
    }

    /// Converts the error into the record kept in an aggregate result.
    #[must_use]
    pub fn to_failure(&self) -> ProviderFailure {
        ProviderFailure::new(self.kind(), self.message())
    }
}

impl From<ProviderError> for ProviderFailure {
    fn from(error: ProviderError) -> Self {
        error.to_failure()
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(ProviderError::timeout("x").kind(), FailureKind::Timeout);
        assert_eq!(
            ProviderError::parse_failure("x").kind(),
            FailureKind::ParseFailure
        );
        assert_eq!(
            ProviderError::upstream_rejected("x").kind(),
            FailureKind::UpstreamRejected
        );
        assert_eq!(ProviderError::unknown("x").kind(), FailureKind::Unknown);
    }

    #[test]
    fn upstream_rejected_with_status() {
        let error = ProviderError::upstream_rejected_with_status("forbidden", 403);
        assert_eq!(error.status(), Some(403));
        assert_eq!(error.timeout_ms(), None);
    }

    #[test]
    fn to_failure_keeps_message() {
        let failure = ProviderError::parse_failure("missing price").to_failure();
        assert_eq!(failure.error, FailureKind::ParseFailure);
        assert_eq!(failure.message, "missing price");
    }

    #[test]
    fn display_format() {
        let error = ProviderError::timeout("request timed out");
        let display = error.to_string();
        assert!(display.contains("timeout"));
        assert!(display.contains("request timed out"));
    }
}
