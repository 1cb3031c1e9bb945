//! # REST API
//!
//! HTTP surface built on axum.
//!
//! # Endpoints
//!
//! - `GET /compare-prices` - rate-limited fare comparison
//! - `GET /routes` - routes priced so far
//! - `GET /price-history/{route_id}` - stored quotes for a route
//! - `GET /price-trends` - per-provider statistics over recent days
//! - `GET /health` - liveness
//!
//! # Usage
//!
//! ```ignore
//! use fare_compare::api::rest::{AppState, create_router};
//!
//! let router = create_router(AppState::new(governor, history));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{AppState, HealthResponse, HistoryResponse, TrendResponse};
pub use routes::create_router;
