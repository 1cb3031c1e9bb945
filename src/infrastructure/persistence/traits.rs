//! # Repository Traits
//!
//! Port definitions for price history persistence.
//!
//! # Available Ports
//!
//! - [`PersistenceSink`]: write side, called once per successful quote
//! - [`PriceHistoryRepository`]: read side, backing the history endpoints
//!
//! # Examples
//!
//! ```ignore
//! use fare_compare::infrastructure::persistence::traits::PriceHistoryRepository;
//!
//! async fn list(repo: &impl PriceHistoryRepository) {
//!     let routes = repo.routes().await.unwrap();
//!     println!("{} routes priced so far", routes.len());
//! }
//! ```

use crate::domain::entities::{PriceHistoryRecord, Quote, RouteSummary};
use crate::domain::value_objects::{ProviderId, RouteId, RouteKey, Timestamp};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Stored data could not be mapped back to domain types.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Filter for history lookups. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Earliest record time.
    pub start: Option<Timestamp>,
    /// Latest record time.
    pub end: Option<Timestamp>,
    /// Restrict to one provider.
    pub provider: Option<ProviderId>,
}

impl HistoryQuery {
    /// Returns true if the record passes every filter.
    #[must_use]
    pub fn matches(&self, record: &PriceHistoryRecord) -> bool {
        self.start.is_none_or(|start| record.timestamp >= start)
            && self.end.is_none_or(|end| record.timestamp <= end)
            && self
                .provider
                .as_ref()
                .is_none_or(|provider| &record.service_provider == provider)
    }
}

/// Write side of price history.
///
/// Called from detached tasks after an aggregation; failures are logged by
/// the caller and never reach the client.
#[async_trait]
pub trait PersistenceSink: Send + Sync + fmt::Debug {
    /// Records a quote for a route, registering the route on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the write fails.
    async fn record(&self, route: &RouteKey, quote: &Quote) -> RepositoryResult<()>;
}

/// Read side of price history.
#[async_trait]
pub trait PriceHistoryRepository: Send + Sync + fmt::Debug {
    /// Lists every known route, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the query fails.
    async fn routes(&self) -> RepositoryResult<Vec<RouteSummary>>;

    /// Returns the records for a route matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the route is unknown.
    async fn history(
        &self,
        route_id: &RouteId,
        query: &HistoryQuery,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>>;

    /// Returns the records for a route captured at or after `since`, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the query fails.
    async fn trend_points(
        &self,
        route_id: &RouteId,
        since: Timestamp,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Price;

    fn record(provider: &str, secs: i64) -> PriceHistoryRecord {
        PriceHistoryRecord {
            route_id: RouteId::new("a|b"),
            service_provider: ProviderId::new(provider),
            price: Price::new(100.0).unwrap(),
            currency: "INR".to_string(),
            surge_multiplier: 1.0,
            estimate_minutes: 5,
            timestamp: Timestamp::from_secs(secs).unwrap(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(HistoryQuery::default().matches(&record("uber", 10)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let query = HistoryQuery {
            start: Timestamp::from_secs(10),
            end: Timestamp::from_secs(20),
            provider: None,
        };
        assert!(query.matches(&record("uber", 10)));
        assert!(query.matches(&record("uber", 20)));
        assert!(!query.matches(&record("uber", 21)));
        assert!(!query.matches(&record("uber", 9)));
    }

    #[test]
    fn provider_filter() {
        let query = HistoryQuery {
            provider: Some(ProviderId::new("Ola")),
            ..HistoryQuery::default()
        };
        assert!(query.matches(&record("ola", 1)));
        assert!(!query.matches(&record("uber", 1)));
    }
}
