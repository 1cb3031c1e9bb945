//! # Rate Limiter
//!
//! Per-client admission control over a sliding window.
//!
//! Each identity may be admitted at most `capacity` times in any trailing
//! window of `window` length. Rejected requests do not consume a slot. The
//! counting itself happens atomically inside a [`TokenWindow`], so the same
//! limiter can front many service instances when the window is shared.
//!
//! # Examples
//!
//! ```
//! use fare_compare::application::services::rate_limiter::{RateLimitConfig, RateLimiter};
//! use fare_compare::infrastructure::window::InMemoryTokenWindow;
//! use std::sync::Arc;
//!
//! let limiter = RateLimiter::new(Arc::new(InMemoryTokenWindow::new()), RateLimitConfig::default());
//! assert_eq!(limiter.config().capacity, 100);
//! ```

use crate::domain::value_objects::{ClientIdentity, Timestamp};
use crate::infrastructure::window::{TokenWindow, WindowResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default requests per window.
pub const DEFAULT_CAPACITY: u32 = 100;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default store key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "rate_limit:";

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// When false every request is admitted.
    pub enabled: bool,
    /// Requests allowed per window.
    pub capacity: u32,
    /// Window length.
    pub window: Duration,
    /// Prefix prepended to the identity to form the store key.
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            window: DEFAULT_WINDOW,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Creates an enabled configuration.
    #[must_use]
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            ..Self::default()
        }
    }

    /// Turns rate limiting off.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until a slot frees up; set only on rejection and always positive.
    pub retry_after: Option<Duration>,
    /// When the oldest counted request leaves the window.
    pub reset_at: Timestamp,
}

impl Admission {
    fn unlimited(now: Timestamp) -> Self {
        Self {
            allowed: true,
            limit: u32::MAX,
            remaining: u32::MAX,
            retry_after: None,
            reset_at: now,
        }
    }
}

/// Sliding-window rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Arc<dyn TokenWindow>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a limiter over a window store.
    #[must_use]
    pub fn new(window: Arc<dyn TokenWindow>, config: RateLimitConfig) -> Self {
        Self { window, config }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn key(&self, identity: &ClientIdentity) -> String {
        format!("{}{}", self.config.key_prefix, identity)
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.config.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Checks and records one request for `identity` at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`](crate::infrastructure::window::WindowError) if
    /// the window store fails.
    pub async fn admit(&self, identity: &ClientIdentity) -> WindowResult<Admission> {
        self.admit_at(identity, Timestamp::now()).await
    }

    /// Checks and records one request for `identity` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`](crate::infrastructure::window::WindowError) if
    /// the window store fails.
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn admit_at(
        &self,
        identity: &ClientIdentity,
        now: Timestamp,
    ) -> WindowResult<Admission> {
        if !self.config.enabled {
            return Ok(Admission::unlimited(now));
        }

        let now_ms = now.timestamp_millis();
        let outcome = self
            .window
            .try_acquire(
                &self.key(identity),
                now_ms,
                self.config.window,
                self.config.capacity,
            )
            .await?;

        let oldest_ms = outcome.oldest_ms.unwrap_or(now_ms);
        let reset_at = Timestamp::from_millis(oldest_ms.saturating_add(self.window_ms()))
            .unwrap_or(now);

        if outcome.admitted {
            let remaining = self
                .config
                .capacity
                .saturating_sub(outcome.count)
                .saturating_sub(1);
            debug!(remaining, "request admitted");
            return Ok(Admission {
                allowed: true,
                limit: self.config.capacity,
                remaining,
                retry_after: None,
                reset_at,
            });
        }

        let wait_ms = reset_at.timestamp_millis().saturating_sub(now_ms).max(1);
        let retry_after = Duration::from_millis(u64::try_from(wait_ms).unwrap_or(1));
        debug!(
            count = outcome.count,
            retry_after_ms = wait_ms,
            "request rejected"
        );

        Ok(Admission {
            allowed: false,
            limit: self.config.capacity,
            remaining: 0,
            retry_after: Some(retry_after),
            reset_at,
        })
    }

    /// Returns how many requests `identity` may still make in the current
    /// window, without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`](crate::infrastructure::window::WindowError) if
    /// the window store fails.
    pub async fn remaining(&self, identity: &ClientIdentity) -> WindowResult<u32> {
        if !self.config.enabled {
            return Ok(u32::MAX);
        }
        let count = self
            .window
            .count(
                &self.key(identity),
                Timestamp::now().timestamp_millis(),
                self.config.window,
            )
            .await?;
        Ok(self.config.capacity.saturating_sub(count))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::window::InMemoryTokenWindow;

    fn limiter(capacity: u32) -> RateLimiter {
        RateLimiter::new(
            Arc::new(InMemoryTokenWindow::new()),
            RateLimitConfig::new(capacity, Duration::from_secs(60)),
        )
    }

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms).unwrap()
    }

    #[tokio::test]
    async fn hundred_and_first_request_is_rejected() {
        let limiter = limiter(100);
        let client = ClientIdentity::new("1.2.3.4");
        let start = 1_700_000_000_000;

        for i in 0..100 {
            let admission = limiter.admit_at(&client, at(start + i)).await.unwrap();
            assert!(admission.allowed);
            assert_eq!(admission.remaining, u32::try_from(99 - i).unwrap());
        }

        let rejected = limiter.admit_at(&client, at(start + 100)).await.unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        let retry_after = rejected.retry_after.unwrap();
        assert!(retry_after > Duration::ZERO);
        // oldest entry at `start` leaves the window at start + 60s
        assert_eq!(retry_after, Duration::from_millis(59_900));
    }

    #[tokio::test]
    async fn rejection_does_not_consume_a_slot() {
        let limiter = limiter(1);
        let client = ClientIdentity::new("c");
        assert!(limiter.admit_at(&client, at(0)).await.unwrap().allowed);
        for i in 1..10 {
            assert!(!limiter.admit_at(&client, at(i)).await.unwrap().allowed);
        }
        // only the first admission counts, so the slot frees after one window
        assert!(limiter.admit_at(&client, at(60_001)).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn retry_after_is_at_least_one_millisecond() {
        let limiter = limiter(1);
        let client = ClientIdentity::new("c");
        limiter.admit_at(&client, at(0)).await.unwrap();
        let edge = limiter.admit_at(&client, at(60_000)).await.unwrap();
        assert!(!edge.allowed);
        assert_eq!(edge.retry_after, Some(Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn identities_are_isolated() {
        let limiter = limiter(1);
        assert!(limiter.admit(&ClientIdentity::new("a")).await.unwrap().allowed);
        assert!(limiter.admit(&ClientIdentity::new("b")).await.unwrap().allowed);
        assert!(!limiter.admit(&ClientIdentity::new("a")).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn remaining_is_read_only() {
        let limiter = limiter(5);
        let client = ClientIdentity::new("c");
        limiter.admit(&client).await.unwrap();
        assert_eq!(limiter.remaining(&client).await.unwrap(), 4);
        assert_eq!(limiter.remaining(&client).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn disabled_limiter_admits_everything() {
        let limiter = RateLimiter::new(
            Arc::new(InMemoryTokenWindow::new()),
            RateLimitConfig::new(1, Duration::from_secs(60)).disabled(),
        );
        let client = ClientIdentity::new("c");
        for _ in 0..5 {
            let admission = limiter.admit(&client).await.unwrap();
            assert!(admission.allowed);
            assert_eq!(admission.limit, u32::MAX);
        }
        assert_eq!(limiter.remaining(&client).await.unwrap(), u32::MAX);
    }
}
