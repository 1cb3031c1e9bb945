//! # In-Memory Token Window
//!
//! Single-process [`TokenWindow`] backed by a [`DashMap`]. The per-key entry
//! lock makes each acquire atomic for that key; different keys do not
//! contend. Keys are only created by an admitted request; idle keys are
//! dropped by [`InMemoryTokenWindow::purge_idle`].

use super::traits::{TokenWindow, WindowOutcome, WindowResult, window_millis};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;

/// In-memory sliding-window counter.
#[derive(Debug, Default)]
pub struct InMemoryTokenWindow {
    windows: DashMap<String, Vec<i64>>,
}

impl InMemoryTokenWindow {
    /// Creates an empty window store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops entries older than `now_ms - window` and removes keys left
    /// empty, bounding memory for identities that stopped calling.
    pub fn purge_idle(&self, now_ms: i64, window: Duration) {
        let cutoff = now_ms.saturating_sub(window_millis(window));
        self.windows.retain(|_, entries| {
            entries.retain(|t| *t >= cutoff);
            !entries.is_empty()
        });
    }

    /// Returns the number of tracked keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl TokenWindow for InMemoryTokenWindow {
    async fn try_acquire(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        capacity: u32,
    ) -> WindowResult<WindowOutcome> {
        let cutoff = now_ms.saturating_sub(window_millis(window));

        let mut entry = match self.windows.entry(key.to_string()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(vacant) => {
                let admitted = capacity > 0;
                if admitted {
                    vacant.insert(vec![now_ms]);
                }
                return Ok(WindowOutcome {
                    admitted,
                    count: 0,
                    oldest_ms: None,
                });
            }
        };

        let entries = entry.get_mut();
        entries.retain(|t| *t >= cutoff);

        let count = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let oldest_ms = entries.iter().min().copied();
        let admitted = count < capacity;
        if admitted {
            entries.push(now_ms);
        } else if entries.is_empty() {
            entry.remove();
        }

        Ok(WindowOutcome {
            admitted,
            count,
            oldest_ms,
        })
    }

    async fn count(&self, key: &str, now_ms: i64, window: Duration) -> WindowResult<u32> {
        let cutoff = now_ms.saturating_sub(window_millis(window));
        let count = self
            .windows
            .get(key)
            .map_or(0, |entries| entries.iter().filter(|t| **t >= cutoff).count());
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn admits_up_to_capacity() {
        let store = InMemoryTokenWindow::new();
        for i in 0..3 {
            let outcome = store.try_acquire("ip", 1_000 + i, WINDOW, 3).await.unwrap();
            assert!(outcome.admitted);
            assert_eq!(outcome.count, u32::try_from(i).unwrap());
        }

        let rejected = store.try_acquire("ip", 1_010, WINDOW, 3).await.unwrap();
        assert!(!rejected.admitted);
        assert_eq!(rejected.count, 3);
        assert_eq!(rejected.oldest_ms, Some(1_000));
        assert_eq!(store.count("ip", 1_010, WINDOW).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn entries_expire_after_window() {
        let store = InMemoryTokenWindow::new();
        store.try_acquire("ip", 0, WINDOW, 1).await.unwrap();

        // exactly one window later the entry still counts
        let edge = store.try_acquire("ip", 60_000, WINDOW, 1).await.unwrap();
        assert!(!edge.admitted);

        let after = store.try_acquire("ip", 60_001, WINDOW, 1).await.unwrap();
        assert!(after.admitted);
        assert_eq!(after.count, 0);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = InMemoryTokenWindow::new();
        assert!(store.try_acquire("a", 0, WINDOW, 1).await.unwrap().admitted);
        assert!(store.try_acquire("b", 0, WINDOW, 1).await.unwrap().admitted);
        assert!(!store.try_acquire("a", 1, WINDOW, 1).await.unwrap().admitted);
    }

    #[tokio::test]
    async fn concurrent_acquires_never_exceed_capacity() {
        let store = Arc::new(InMemoryTokenWindow::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .try_acquire("ip", 5_000 + i, WINDOW, 10)
                    .await
                    .unwrap()
                    .admitted
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[tokio::test]
    async fn purge_idle_drops_stale_keys() {
        let store = InMemoryTokenWindow::new();
        store.try_acquire("old", 0, WINDOW, 5).await.unwrap();
        store.try_acquire("new", 100_000, WINDOW, 5).await.unwrap();
        store.purge_idle(100_000, WINDOW);
        assert_eq!(store.key_count(), 1);
    }

    #[tokio::test]
    async fn rejected_new_keys_are_not_stored() {
        let store = InMemoryTokenWindow::new();
        for i in 0..10 {
            let outcome = store
                .try_acquire(&format!("ip-{}", i), 0, WINDOW, 0)
                .await
                .unwrap();
            assert!(!outcome.admitted);
        }
        assert_eq!(store.key_count(), 0);
    }
}
