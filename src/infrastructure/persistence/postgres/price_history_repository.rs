//! # PostgreSQL Price History Repository
//!
//! PostgreSQL implementation of [`PersistenceSink`] and
//! [`PriceHistoryRepository`] using sqlx.
//!
//! Routes are upserted on every record so `updated_at` tracks the latest
//! observation; history rows are append-only.

use crate::domain::entities::{PriceHistoryRecord, Quote, RouteSummary};
use crate::domain::value_objects::{Price, ProviderId, RouteId, RouteKey, Timestamp};
use crate::infrastructure::persistence::traits::{
    HistoryQuery, PersistenceSink, PriceHistoryRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

const CREATE_ROUTES: &str = r"
CREATE TABLE IF NOT EXISTS routes (
    id TEXT PRIMARY KEY,
    pickup_location TEXT NOT NULL,
    dropoff_location TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)";

const CREATE_PRICE_HISTORY: &str = r"
CREATE TABLE IF NOT EXISTS price_history (
    id BIGSERIAL PRIMARY KEY,
    route_id TEXT NOT NULL REFERENCES routes(id),
    service_provider TEXT NOT NULL,
    price NUMERIC NOT NULL,
    currency TEXT NOT NULL,
    surge_multiplier DOUBLE PRECISION NOT NULL,
    estimate_minutes INTEGER NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL
)";

const CREATE_HISTORY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS price_history_route_time
    ON price_history (route_id, recorded_at)";

/// PostgreSQL price history.
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use fare_compare::infrastructure::persistence::postgres::PostgresPriceHistoryRepository;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let repo = PostgresPriceHistoryRepository::new(pool);
/// repo.migrate().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresPriceHistoryRepository {
    pool: PgPool,
}

impl PostgresPriceHistoryRepository {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if a statement fails.
    pub async fn migrate(&self) -> RepositoryResult<()> {
        for statement in [CREATE_ROUTES, CREATE_PRICE_HISTORY, CREATE_HISTORY_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| RepositoryError::query(e.to_string()))?;
        }
        Ok(())
    }

    async fn route_exists(&self, route_id: &RouteId) -> RepositoryResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
            .bind(route_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;
        Ok(exists)
    }
}

#[async_trait]
impl PersistenceSink for PostgresPriceHistoryRepository {
    #[instrument(skip(self, quote), fields(provider = %quote.provider()))]
    async fn record(&self, route: &RouteKey, quote: &Quote) -> RepositoryResult<()> {
        let route_id = route.id();
        let captured_at = *quote.captured_at().as_datetime();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO routes (id, pickup_location, dropoff_location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(route_id.as_str())
        .bind(route.pickup_display())
        .bind(route.dropoff_display())
        .bind(captured_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO price_history
                (route_id, service_provider, price, currency, surge_multiplier,
                 estimate_minutes, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(route_id.as_str())
        .bind(quote.provider().as_str())
        .bind(quote.price().get())
        .bind(quote.currency())
        .bind(quote.surge_multiplier())
        .bind(i32::try_from(quote.estimate_minutes()).unwrap_or(i32::MAX))
        .bind(captured_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))
    }
}

#[async_trait]
impl PriceHistoryRepository for PostgresPriceHistoryRepository {
    async fn routes(&self) -> RepositoryResult<Vec<RouteSummary>> {
        let rows: Vec<RouteRow> = sqlx::query_as(
            "SELECT id, pickup_location, dropoff_location, created_at FROM routes ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(rows.into_iter().map(RouteRow::into_summary).collect())
    }

    async fn history(
        &self,
        route_id: &RouteId,
        query: &HistoryQuery,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>> {
        if !self.route_exists(route_id).await? {
            return Err(RepositoryError::not_found("route", route_id.as_str()));
        }

        let rows: Vec<HistoryRow> = sqlx::query_as(
            r"
            SELECT route_id, service_provider, price, currency, surge_multiplier,
                   estimate_minutes, recorded_at
            FROM price_history
            WHERE route_id = $1
              AND ($2::timestamptz IS NULL OR recorded_at >= $2)
              AND ($3::timestamptz IS NULL OR recorded_at <= $3)
              AND ($4::text IS NULL OR service_provider = $4)
            ORDER BY recorded_at DESC
            ",
        )
        .bind(route_id.as_str())
        .bind(query.start.map(Timestamp::into_inner))
        .bind(query.end.map(Timestamp::into_inner))
        .bind(query.provider.as_ref().map(ProviderId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(HistoryRow::try_into_record).collect()
    }

    async fn trend_points(
        &self,
        route_id: &RouteId,
        since: Timestamp,
    ) -> RepositoryResult<Vec<PriceHistoryRecord>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r"
            SELECT route_id, service_provider, price, currency, surge_multiplier,
                   estimate_minutes, recorded_at
            FROM price_history
            WHERE route_id = $1 AND recorded_at >= $2
            ORDER BY recorded_at
            ",
        )
        .bind(route_id.as_str())
        .bind(since.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(HistoryRow::try_into_record).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: String,
    pickup_location: String,
    dropoff_location: String,
    created_at: DateTime<Utc>,
}

impl RouteRow {
    fn into_summary(self) -> RouteSummary {
        RouteSummary {
            id: RouteId::new(self.id),
            pickup_location: self.pickup_location,
            dropoff_location: self.dropoff_location,
            created_at: Timestamp::from(self.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    route_id: String,
    service_provider: String,
    price: Decimal,
    currency: String,
    surge_multiplier: f64,
    estimate_minutes: i32,
    recorded_at: DateTime<Utc>,
}

impl HistoryRow {
    fn try_into_record(self) -> RepositoryResult<PriceHistoryRecord> {
        let price = Price::from_decimal(self.price)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let estimate_minutes = u32::try_from(self.estimate_minutes)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        Ok(PriceHistoryRecord {
            route_id: RouteId::new(self.route_id),
            service_provider: ProviderId::new(self.service_provider),
            price,
            currency: self.currency,
            surge_multiplier: self.surge_multiplier,
            estimate_minutes,
            timestamp: Timestamp::from(self.recorded_at),
        })
    }
}
