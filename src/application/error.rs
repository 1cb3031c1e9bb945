//! # Application Errors
//!
//! Error types for the application layer.
//!
//! # Error Hierarchy
//!
//! ```text
//! GovernorError
//! ├── RateLimited{retry_after, limit, reset_at}  - admission rejected
//! ├── InvalidRoute(String)                      - bad pickup/dropoff
//! └── DependencyUnavailable(String)             - window store or cache failed
//!
//! AggregationError
//! ├── InvalidRoute(String)
//! └── DependencyUnavailable(String)
//! ```
//!
//! Per-provider failures are not errors at this level; they are recorded
//! inside the [`AggregateResult`](crate::domain::entities::AggregateResult).
//!
//! # Examples
//!
//! ```
//! use fare_compare::application::error::{AggregationError, GovernorError};
//!
//! let err: GovernorError = AggregationError::invalid_route("pickup is empty").into();
//! assert!(err.is_invalid_route());
//! ```

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Timestamp;
use crate::infrastructure::cache::CacheError;
use crate::infrastructure::window::WindowError;
use std::time::Duration;
use thiserror::Error;

/// Error returned by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The route failed validation.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// The response cache could not be read.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl AggregationError {
    /// Creates an invalid route error.
    #[must_use]
    pub fn invalid_route(message: impl Into<String>) -> Self {
        Self::InvalidRoute(message.into())
    }

    /// Creates a dependency error.
    #[must_use]
    pub fn dependency_unavailable(message: impl Into<String>) -> Self {
        Self::DependencyUnavailable(message.into())
    }
}

impl From<DomainError> for AggregationError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidRoute(message) => Self::InvalidRoute(message),
            other => Self::InvalidRoute(other.to_string()),
        }
    }
}

impl From<CacheError> for AggregationError {
    fn from(error: CacheError) -> Self {
        Self::DependencyUnavailable(format!("response cache: {}", error))
    }
}

/// Error returned by the request governor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernorError {
    /// The client exceeded its request budget.
    #[error("rate limit exceeded, retry after {}ms", retry_after.as_millis())]
    RateLimited {
        /// Time until a slot frees up. Always positive.
        retry_after: Duration,
        /// Requests allowed per window.
        limit: u32,
        /// When the oldest counted request leaves the window.
        reset_at: Timestamp,
    },

    /// The route failed validation.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A shared store could not be reached.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl GovernorError {
    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(retry_after: Duration, limit: u32, reset_at: Timestamp) -> Self {
        Self::RateLimited {
            retry_after,
            limit,
            reset_at,
        }
    }

    /// Creates a dependency error.
    #[must_use]
    pub fn dependency_unavailable(message: impl Into<String>) -> Self {
        Self::DependencyUnavailable(message.into())
    }

    /// Returns true if this is a rate limit rejection.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true if this is an invalid route error.
    #[must_use]
    pub fn is_invalid_route(&self) -> bool {
        matches!(self, Self::InvalidRoute(_))
    }

    /// Returns the retry delay for rate limit rejections.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<AggregationError> for GovernorError {
    fn from(error: AggregationError) -> Self {
        match error {
            AggregationError::InvalidRoute(message) => Self::InvalidRoute(message),
            AggregationError::DependencyUnavailable(message) => {
                Self::DependencyUnavailable(message)
            }
        }
    }
}

impl From<WindowError> for GovernorError {
    fn from(error: WindowError) -> Self {
        Self::DependencyUnavailable(format!("rate limit store: {}", error))
    }
}

impl From<CacheError> for GovernorError {
    fn from(error: CacheError) -> Self {
        AggregationError::from(error).into()
    }
}
