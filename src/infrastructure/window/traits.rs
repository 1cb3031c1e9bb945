//! # Token Window Trait
//!
//! Port definition for sliding-window counters.
//!
//! A token window keeps, per key, the set of admission timestamps that fall
//! inside the trailing window. [`TokenWindow::try_acquire`] prunes expired
//! entries, checks the count against capacity and records the new entry as
//! one atomic step, so concurrent callers for the same key can never admit
//! more than `capacity` requests per window.
//!
//! # Available Implementations
//!
//! - [`InMemoryTokenWindow`](super::in_memory::InMemoryTokenWindow): single process
//! - [`RedisTokenWindow`](super::redis::RedisTokenWindow): shared across instances

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type for window store operations.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The backing store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered with something unexpected.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl WindowError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Result type for window store operations.
pub type WindowResult<T> = Result<T, WindowError>;

/// Result of one acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether an entry was recorded.
    pub admitted: bool,
    /// Entries inside the window before this attempt.
    pub count: u32,
    /// Timestamp in milliseconds of the oldest entry still inside the window,
    /// before this attempt. `None` when the window was empty.
    pub oldest_ms: Option<i64>,
}

/// Sliding-window counter keyed by string.
#[async_trait]
pub trait TokenWindow: Send + Sync + fmt::Debug {
    /// Atomically prunes entries older than `now_ms - window`, and records a
    /// new entry at `now_ms` if fewer than `capacity` remain.
    ///
    /// Entries exactly `window` old are still counted. A rejected attempt
    /// leaves the stored entries unchanged apart from the prune.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if the backing store fails.
    async fn try_acquire(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        capacity: u32,
    ) -> WindowResult<WindowOutcome>;

    /// Counts entries inside the window ending at `now_ms` without recording
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if the backing store fails.
    async fn count(&self, key: &str, now_ms: i64, window: Duration) -> WindowResult<u32>;
}

/// Window length as whole milliseconds, saturating.
#[must_use]
pub(crate) fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}
