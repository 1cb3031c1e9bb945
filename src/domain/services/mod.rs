//! # Domain Services
//!
//! Stateless computations over domain entities.

pub mod price_trend;

pub use price_trend::{ProviderTrend, TrendPoint, compute_trends};
