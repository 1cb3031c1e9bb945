//! # In-Memory Response Cache
//!
//! Single-process [`ResponseCache`]. Expired entries are dropped lazily on
//! read and in bulk by [`InMemoryResponseCache::purge_expired`].

use super::traits::{CacheResult, ResponseCache};
use crate::domain::entities::AggregateResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: AggregateResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory TTL cache.
#[derive(Debug, Default)]
pub struct InMemoryResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryResponseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> CacheResult<Option<AggregateResult>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn put(&self, key: &str, value: &AggregateResult, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{RouteKey, Timestamp};
    use std::collections::BTreeMap;

    fn result() -> AggregateResult {
        AggregateResult::new(RouteKey::new("a", "b"), Timestamp::now(), BTreeMap::new())
    }

    #[tokio::test]
    async fn get_after_put() {
        let cache = InMemoryResponseCache::new();
        cache.put("a|b", &result(), Duration::from_secs(300)).await.unwrap();
        let cached = cache.get("a|b").await.unwrap().unwrap();
        assert_eq!(cached.route(), &RouteKey::new("a", "b"));
        assert!(cache.get("c|d").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = InMemoryResponseCache::new();
        cache.put("a|b", &result(), Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("a|b").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("a|b").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_removes_only_stale() {
        let cache = InMemoryResponseCache::new();
        cache.put("short", &result(), Duration::from_secs(1)).await.unwrap();
        cache.put("long", &result(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = InMemoryResponseCache::new();
        cache.put("a|b", &result(), Duration::from_secs(300)).await.unwrap();
        cache.invalidate("a|b").await.unwrap();
        assert!(cache.get("a|b").await.unwrap().is_none());
    }
}
