//! # Guarded Provider
//!
//! Decorator that bounds every attempt against a [`ProviderClient`] with a
//! timeout and retries failed attempts with backoff.

use crate::application::services::retry::RetryExecutor;
use crate::domain::entities::Quote;
use crate::domain::value_objects::{ProviderId, RouteKey, Timestamp};
use crate::infrastructure::providers::{ProviderClient, ProviderError, ProviderResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider wrapped with a per-attempt timeout and retry.
#[derive(Debug, Clone)]
pub struct GuardedProvider {
    inner: Arc<dyn ProviderClient>,
    attempt_timeout: Duration,
    retry: RetryExecutor,
}

impl GuardedProvider {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ProviderClient>, attempt_timeout: Duration, retry: RetryExecutor) -> Self {
        Self {
            inner,
            attempt_timeout,
            retry,
        }
    }

    /// Returns the per-attempt timeout.
    #[inline]
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }
}

#[async_trait]
impl ProviderClient for GuardedProvider {
    fn provider_id(&self) -> &ProviderId {
        self.inner.provider_id()
    }

    async fn fetch_quote(&self, route: &RouteKey, at: Option<Timestamp>) -> ProviderResult<Quote> {
        let timeout_ms = u64::try_from(self.attempt_timeout.as_millis()).unwrap_or(u64::MAX);
        self.retry
            .execute(|| async move {
                let result = match timeout(self.attempt_timeout, self.inner.fetch_quote(route, at)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout_with_duration(
                        "provider request timed out",
                        timeout_ms,
                    )),
                };
                if let Err(error) = &result {
                    debug!(provider = %self.inner.provider_id(), error = %error, "provider attempt failed");
                }
                result
            })
            .await
    }
}
