//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`RequestGovernor`]: rate limiting in front of aggregation
//! - [`Aggregator`]: concurrent quote collection with caching
//! - [`RateLimiter`]: per-client sliding-window admission
//! - [`RetryExecutor`]: bounded exponential backoff
//! - [`GuardedProvider`]: per-attempt timeout plus retry around a provider

pub mod aggregator;
pub mod governor;
pub mod guarded_provider;
pub mod rate_limiter;
pub mod retry;

pub use aggregator::{AggregationConfig, Aggregator};
pub use governor::{GovernedResult, RequestGovernor};
pub use guarded_provider::GuardedProvider;
pub use rate_limiter::{Admission, RateLimitConfig, RateLimiter};
pub use retry::{RetryExecutor, RetryPolicy};
