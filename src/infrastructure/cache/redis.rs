//! # Redis Response Cache
//!
//! [`ResponseCache`] shared across instances. Results are stored as JSON
//! strings under `{prefix}{key}` with a millisecond expiry.

use super::traits::{CacheError, CacheResult, ResponseCache};
use crate::domain::entities::AggregateResult;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "fare:cache:";

/// Redis-backed TTL cache.
#[derive(Clone)]
pub struct RedisResponseCache {
    connection: ConnectionManager,
    prefix: String,
}

impl fmt::Debug for RedisResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisResponseCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisResponseCache {
    /// Creates a cache over an established connection.
    #[must_use]
    pub fn new(connection: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            connection,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn to_cache_error(error: redis::RedisError) -> CacheError {
    CacheError::connection(error.to_string())
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> CacheResult<Option<AggregateResult>> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut connection)
            .await
            .map_err(to_cache_error)?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(CacheError::from)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn put(&self, key: &str, value: &AggregateResult, ttl: Duration) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut connection = self.connection.clone();

        redis::cmd("SET")
            .arg(self.key(key))
            .arg(json)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<()>(&mut connection)
            .await
            .map_err(to_cache_error)
    }

    #[instrument(skip(self), level = "debug")]
    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<()>(&mut connection)
            .await
            .map_err(to_cache_error)
    }
}
