//! # Response Cache Trait
//!
//! Port definition for the short-lived cache of aggregate results.
//!
//! Entries are written whole and never partially updated. There is no
//! eviction beyond expiry.

use crate::domain::entities::AggregateResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A stored entry could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// TTL cache of aggregate results keyed by route.
#[async_trait]
pub trait ResponseCache: Send + Sync + fmt::Debug {
    /// Returns the cached result, or `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store fails.
    async fn get(&self, key: &str) -> CacheResult<Option<AggregateResult>>;

    /// Stores a result, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store fails.
    async fn put(&self, key: &str, value: &AggregateResult, ttl: Duration) -> CacheResult<()>;

    /// Removes an entry if present.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store fails.
    async fn invalidate(&self, key: &str) -> CacheResult<()>;
}
