//! # Memory Sweeper
//!
//! Background task that bounds the in-process stores: idle rate-limit
//! windows and expired cache entries are otherwise only dropped when their
//! key is touched again.

use crate::domain::value_objects::Timestamp;
use crate::infrastructure::cache::InMemoryResponseCache;
use crate::infrastructure::window::InMemoryTokenWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns a task that purges `window` and `cache` every `every`.
///
/// `rate_window` is the limiter's window length; entries older than it no
/// longer count and are dropped. The task runs until the handle is aborted
/// or the runtime shuts down.
pub fn spawn_memory_sweeper(
    window: Arc<InMemoryTokenWindow>,
    cache: Arc<InMemoryResponseCache>,
    rate_window: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            window.purge_idle(Timestamp::now().timestamp_millis(), rate_window);
            let expired = cache.purge_expired();
            debug!(
                window_keys = window.key_count(),
                cache_entries = cache.len(),
                expired,
                "swept in-memory stores"
            );
        }
    })
}
