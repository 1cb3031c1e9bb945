//! # REST Handlers
//!
//! Request handlers, shared state and wire types.

use crate::api::rest::error::{ApiError, rate_limit_headers};
use crate::application::services::RequestGovernor;
use crate::domain::entities::{AggregateResult, PriceHistoryRecord, RouteSummary};
use crate::domain::services::{ProviderTrend, compute_trends};
use crate::domain::value_objects::{ClientIdentity, ProviderId, RouteId, RouteKey, Timestamp};
use crate::infrastructure::persistence::{HistoryQuery, PriceHistoryRepository};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{Extensions, HeaderMap};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Default trend window in days.
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Longest trend window accepted.
pub const MAX_TREND_DAYS: u32 = 365;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Rate-limited aggregation entry point.
    pub governor: Arc<RequestGovernor>,
    /// Price history reads.
    pub history: Arc<dyn PriceHistoryRepository>,
    /// Service version reported by `/health`.
    pub version: &'static str,
    /// Whether client identity may come from proxy headers.
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(
        governor: Arc<RequestGovernor>,
        history: Arc<dyn PriceHistoryRepository>,
    ) -> Self {
        Self {
            governor,
            history,
            version: env!("CARGO_PKG_VERSION"),
            trust_proxy_headers: false,
        }
    }

    /// Keys rate limiting on `X-Forwarded-For` / `X-Real-IP` when `trust` is
    /// set.
    #[must_use]
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

/// Query for `GET /compare-prices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareParams {
    /// Pickup location.
    #[serde(default, alias = "pickup_location")]
    pub pickup: Option<String>,
    /// Dropoff location.
    #[serde(default, alias = "dropoff_location")]
    pub dropoff: Option<String>,
    /// Ride time, ISO 8601.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Query for `GET /price-history/{route_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    /// Earliest record, ISO 8601.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Latest record, ISO 8601.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Restrict to one provider.
    #[serde(default)]
    pub service_provider: Option<String>,
}

/// Query for `GET /price-trends`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendParams {
    /// Route to chart.
    pub route_id: String,
    /// Days of history to include.
    #[serde(default = "default_trend_days")]
    pub days: u32,
}

fn default_trend_days() -> u32 {
    DEFAULT_TREND_DAYS
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Price history response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// The route.
    pub route: RouteSummary,
    /// Matching records, newest first.
    pub history: Vec<PriceHistoryRecord>,
}

/// Price trend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    /// The route.
    pub route: RouteSummary,
    /// Days of history covered.
    pub days: u32,
    /// Per-provider statistics.
    pub trends: BTreeMap<ProviderId, ProviderTrend>,
}

/// Identifies the caller for rate limiting.
///
/// Without `trust_proxy_headers` only the peer address is used. With it the
/// order is: first `X-Forwarded-For` entry, `X-Real-IP`, peer address. Either
/// way the fallback is [`ClientIdentity::ANONYMOUS`].
#[must_use]
pub fn extract_client_id(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy_headers: bool,
) -> ClientIdentity {
    trust_proxy_headers
        .then(|| proxy_client_id(headers))
        .flatten()
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| ClientIdentity::new(addr.ip().to_string()))
        })
        .unwrap_or_else(|| ClientIdentity::new(ClientIdentity::ANONYMOUS))
}

fn proxy_client_id(headers: &HeaderMap) -> Option<ClientIdentity> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(ip) = forwarded {
        return Some(ClientIdentity::new(ip));
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ClientIdentity::new)
}

/// Parses an ISO 8601 time. Values without an offset are taken as UTC.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` naming `field` if the value is malformed.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<Timestamp, ApiError> {
    let raw = raw.trim();
    if let Ok(ts) = Timestamp::parse_rfc3339(raw) {
        return Ok(ts);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Timestamp::from(naive.and_utc()))
        .map_err(|_| ApiError::bad_request(format!("{} is not an ISO 8601 time: {}", field, raw)))
}

fn parse_optional(field: &str, raw: Option<&str>) -> Result<Option<Timestamp>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_timestamp(field, s))
        .transpose()
}

async fn find_route(
    repository: &dyn PriceHistoryRepository,
    route_id: &RouteId,
) -> Result<RouteSummary, ApiError> {
    repository
        .routes()
        .await?
        .into_iter()
        .find(|route| &route.id == route_id)
        .ok_or_else(|| ApiError::not_found(format!("route not found: {}", route_id)))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.to_string(),
    })
}

/// `GET /compare-prices`
///
/// # Errors
///
/// 429 when rate limited, 400 for a bad route or timestamp, 503 when a
/// shared store is down.
pub async fn compare_prices(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    query: Result<Query<CompareParams>, QueryRejection>,
) -> Result<(HeaderMap, Json<AggregateResult>), ApiError> {
    let Query(params) = query?;
    let identity = extract_client_id(&headers, &extensions, state.trust_proxy_headers);
    let at = parse_optional("timestamp", params.timestamp.as_deref())?;
    let route = RouteKey::new(
        params.pickup.unwrap_or_default(),
        params.dropoff.unwrap_or_default(),
    );

    let governed = state
        .governor
        .handle_request(&identity, &route, at)
        .await?;

    let admission = governed.admission;
    let headers = rate_limit_headers(admission.limit, admission.remaining, admission.reset_at);
    Ok((headers, Json(governed.result)))
}

/// `GET /routes`
///
/// # Errors
///
/// Fails if the history store cannot be read.
pub async fn list_routes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RouteSummary>>, ApiError> {
    Ok(Json(state.history.routes().await?))
}

/// `GET /price-history/{route_id}`
///
/// # Errors
///
/// 404 for an unknown route, 400 for a malformed date.
pub async fn price_history(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
    query: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) = query?;
    let route_id = RouteId::new(route_id);
    let query = HistoryQuery {
        start: parse_optional("start_date", params.start_date.as_deref())?,
        end: parse_optional("end_date", params.end_date.as_deref())?,
        provider: params
            .service_provider
            .filter(|p| !p.trim().is_empty())
            .map(ProviderId::new),
    };

    let route = find_route(state.history.as_ref(), &route_id).await?;
    let history = state.history.history(&route_id, &query).await?;
    debug!(route_id = %route_id, records = history.len(), "price history served");

    Ok(Json(HistoryResponse { route, history }))
}

/// `GET /price-trends`
///
/// # Errors
///
/// 404 for an unknown route, 400 for `days` outside `1..=365`.
pub async fn price_trends(
    State(state): State<AppState>,
    query: Result<Query<TrendParams>, QueryRejection>,
) -> Result<Json<TrendResponse>, ApiError> {
    let Query(params) = query?;
    if params.days == 0 || params.days > MAX_TREND_DAYS {
        return Err(ApiError::bad_request(format!(
            "days must be between 1 and {}",
            MAX_TREND_DAYS
        )));
    }

    let route_id = RouteId::new(params.route_id);
    let route = find_route(state.history.as_ref(), &route_id).await?;

    let since = Timestamp::now().sub_days(i64::from(params.days));
    let records = state.history.trend_points(&route_id, since).await?;
    let providers = state.governor.aggregator().provider_ids();

    Ok(Json(TrendResponse {
        route,
        days: params.days,
        trends: compute_trends(&records, &providers),
    }))
}
