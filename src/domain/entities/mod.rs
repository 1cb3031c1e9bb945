//! # Domain Entities
//!
//! - [`Quote`]: a normalized fare quote from one provider
//! - [`AggregateResult`]: per-provider outcomes for one route
//! - [`PriceHistoryRecord`]: a stored quote observation

pub mod aggregate;
pub mod price_history;
pub mod quote;

pub use aggregate::{AggregateResult, FailureKind, ProviderFailure, ProviderOutcome};
pub use price_history::{PriceHistoryRecord, RouteSummary};
pub use quote::{DEFAULT_CURRENCY, NO_SURGE, Quote, QuoteBuilder};
