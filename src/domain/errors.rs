//! # Domain Errors
//!
//! Validation failures raised while constructing domain values.

use thiserror::Error;

/// Error type for domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The route cannot be aggregated.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A price was zero, negative or not representable.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A quote field violated its invariant.
    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    /// An identifier was empty or malformed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl DomainError {
    /// Creates an invalid route error.
    #[must_use]
    pub fn invalid_route(message: impl Into<String>) -> Self {
        Self::InvalidRoute(message.into())
    }

    /// Creates an invalid price error.
    #[must_use]
    pub fn invalid_price(message: impl Into<String>) -> Self {
        Self::InvalidPrice(message.into())
    }

    /// Creates an invalid quote error.
    #[must_use]
    pub fn invalid_quote(message: impl Into<String>) -> Self {
        Self::InvalidQuote(message.into())
    }

    /// Creates an invalid identifier error.
    #[must_use]
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }
}

/// Result type for domain validation.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = DomainError::invalid_route("pickup and dropoff are identical");
        assert_eq!(
            err.to_string(),
            "invalid route: pickup and dropoff are identical"
        );
    }
}
