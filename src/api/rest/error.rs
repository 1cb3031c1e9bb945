//! # API Errors
//!
//! Mapping from application errors to HTTP responses.
//!
//! Every error renders as a JSON `{code, message}` body. Rate limit
//! rejections also carry `retry_after` in whole seconds, rounded up, and the
//! `X-RateLimit-*` and `Retry-After` headers.

use crate::application::error::GovernorError;
use crate::domain::value_objects::Timestamp;
use crate::infrastructure::persistence::RepositoryError;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// `X-RateLimit-Limit` header.
pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
/// `X-RateLimit-Remaining` header.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// `X-RateLimit-Reset` header, in epoch seconds.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Seconds until a retry may succeed; only on 429.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Error returned by REST handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller is over its request budget.
    #[error("rate limit exceeded, retry after {} seconds", retry_after_secs(*retry_after))]
    RateLimited {
        /// Time until a slot frees up.
        retry_after: Duration,
        /// Requests allowed per window.
        limit: u32,
        /// When the oldest counted request leaves the window.
        reset_at: Timestamp,
    },

    /// Pickup or dropoff is unusable.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A query parameter could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A shared store could not be reached.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidRoute(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code placed in the body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::InvalidRoute(_) => "INVALID_ROUTE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Whole seconds until `retry_after` has passed, rounded up.
#[must_use]
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    u64::try_from(retry_after.as_millis().div_ceil(1000)).unwrap_or(u64::MAX)
}

/// Builds the `X-RateLimit-*` headers.
#[must_use]
pub fn rate_limit_headers(limit: u32, remaining: u32, reset_at: Timestamp) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let entries = [
        (RATE_LIMIT_LIMIT, limit.to_string()),
        (RATE_LIMIT_REMAINING, remaining.to_string()),
        (RATE_LIMIT_RESET, reset_at.timestamp_secs().to_string()),
    ];
    for (name, value) in entries {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    headers
}

impl From<GovernorError> for ApiError {
    fn from(error: GovernorError) -> Self {
        match error {
            GovernorError::RateLimited {
                retry_after,
                limit,
                reset_at,
            } => Self::RateLimited {
                retry_after,
                limit,
                reset_at,
            },
            GovernorError::InvalidRoute(message) => Self::InvalidRoute(message),
            GovernorError::DependencyUnavailable(message) => Self::DependencyUnavailable(message),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => Self::NotFound(error.to_string()),
            RepositoryError::Connection(_) => Self::DependencyUnavailable(error.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        }

        let mut body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            retry_after: None,
        };

        let mut headers = HeaderMap::new();
        if let Self::RateLimited {
            retry_after,
            limit,
            reset_at,
        } = &self
        {
            let secs = retry_after_secs(*retry_after);
            body.retry_after = Some(secs);
            headers = rate_limit_headers(*limit, 0, *reset_at);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        (status, headers, Json(body)).into_response()
    }
}
