//! # In-Memory Price History Repository
//!
//! In-memory implementation of [`PersistenceSink`] and
//! [`PriceHistoryRepository`] for tests and storage-less runs.

use crate::domain::entities::{PriceHistoryRecord, Quote, RouteSummary};
use crate::domain::value_objects::{RouteId, RouteKey, Timestamp};
use crate::infrastructure::persistence::traits::{
    HistoryQuery, PersistenceSink, PriceHistoryRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Storage {
    routes: Vec<RouteSummary>,
    records: Vec<PriceHistoryRecord>,
}

/// In-memory price history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceHistoryRepository {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryPriceHistoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn record_count(&self) -> usize {
        self.storage.read().await.records.len()
    }
}

#[async_trait]
impl PersistenceSink for InMemoryPriceHistoryRepository {
    async fn record(&self, route: &RouteKey, quote: &Quote) -> RepositoryResult<()> {
        let route_id = route.id();
        let mut storage = self.storage.write().await;
        if !storage.routes.iter().any(|r| r.id == route_id) {
            storage
                .routes
                .push(RouteSummary::from_route(route, quote.captured_at()));
        }
        storage
            .records
            .push(PriceHistoryRecord::from_quote(route_id, quote));
        Ok(())
    }
}

#[async_trait]
impl PriceHistoryRepository for InMemoryPriceHistoryRepository {
    async fn routes(&self) -> RepositoryResult<Vec<RouteSummary>> {
        let mut routes = self.storage.read().await.routes.clone();
        routes.sort_by_key(|r| r.created_at);
        Ok(routes)
    }

    async fn history(
        &self,
        route_id: &RouteId,
        query: &HistoryQuery,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>> {
        let storage = self.storage.read().await;
        if !storage.routes.iter().any(|r| &r.id == route_id) {
            return Err(RepositoryError::not_found("route", route_id.as_str()));
        }

        let mut records: Vec<_> = storage
            .records
            .iter()
            .filter(|r| &r.route_id == route_id && query.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn trend_points(
        &self,
        route_id: &RouteId,
        since: Timestamp,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>> {
        let storage = self.storage.read().await;
        let mut records: Vec<_> = storage
            .records
            .iter()
            .filter(|r| &r.route_id == route_id && r.timestamp >= since)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}
