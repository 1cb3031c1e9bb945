//! # Fare Compare
//!
//! Ride fare aggregation service.
//!
//! A request for a route is admitted by a per-client sliding-window rate
//! limiter, answered from a short-lived response cache when possible, and
//! otherwise fanned out to every configured provider concurrently. Each
//! provider call runs under a timeout with bounded exponential-backoff
//! retry. The merged [`AggregateResult`](domain::entities::AggregateResult)
//! records a quote or a classified failure for every provider, and
//! successful quotes are written to price history in the background.
//!
//! # Layers
//!
//! - [`domain`]: routes, quotes, results and trend statistics
//! - [`application`]: governor, aggregator, rate limiter, retry
//! - [`infrastructure`]: providers, Redis and in-memory stores, PostgreSQL
//! - [`api`]: axum REST surface
//! - [`config`]: layered configuration
//!
//! # Example
//!
//! ```
//! use fare_compare::application::services::{
//!     AggregationConfig, Aggregator, RateLimitConfig, RateLimiter, RequestGovernor,
//! };
//! use fare_compare::domain::value_objects::{ClientIdentity, Price, RouteKey};
//! use fare_compare::infrastructure::cache::InMemoryResponseCache;
//! use fare_compare::infrastructure::persistence::InMemoryPriceHistoryRepository;
//! use fare_compare::infrastructure::providers::{MockProvider, ProviderClient};
//! use fare_compare::infrastructure::window::InMemoryTokenWindow;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let providers: Vec<Arc<dyn ProviderClient>> =
//!     vec![Arc::new(MockProvider::quoting("uber", Price::new(250.0)?))];
//! let aggregator = Aggregator::new(
//!     providers,
//!     Arc::new(InMemoryResponseCache::new()),
//!     Arc::new(InMemoryPriceHistoryRepository::new()),
//!     AggregationConfig::default(),
//! );
//! let limiter = RateLimiter::new(
//!     Arc::new(InMemoryTokenWindow::new()),
//!     RateLimitConfig::new(100, Duration::from_secs(60)),
//! );
//! let governor = RequestGovernor::new(Arc::new(limiter), Arc::new(aggregator));
//!
//! let result = governor
//!     .handle(&ClientIdentity::new("1.2.3.4"), &RouteKey::new("Koramangala", "Indiranagar"))
//!     .await?;
//! assert_eq!(result.quoted_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
