//! # REST Routes
//!
//! Router assembly.

use crate::api::rest::handlers::{
    AppState, compare_prices, health, list_routes, price_history, price_trends,
};
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Builds the service router.
///
/// ```text
/// GET /health
/// GET /compare-prices?pickup&dropoff&timestamp
/// GET /routes
/// GET /price-history/{route_id}?start_date&end_date&service_provider
/// GET /price-trends?route_id&days
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/compare-prices", get(compare_prices))
        .route("/routes", get(list_routes))
        .route("/price-history/{route_id}", get(price_history))
        .route("/price-trends", get(price_trends))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
