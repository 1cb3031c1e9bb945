//! # Aggregate Result
//!
//! The merged, per-provider answer for one route.
//!
//! An [`AggregateResult`] maps every registered provider to either a
//! [`Quote`] or a recorded [`ProviderFailure`]. Failed providers are never
//! dropped from the map. The map is ordered by provider name, so two results
//! built from the same outcomes are identical regardless of the order in
//! which providers finished.

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{ProviderId, RouteKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The provider did not answer in time.
    Timeout,
    /// The provider answered but the payload could not be understood.
    ParseFailure,
    /// The provider refused the request.
    UpstreamRejected,
    /// Anything else, including panics inside a provider task.
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::ParseFailure => write!(f, "PARSE_FAILURE"),
            Self::UpstreamRejected => write!(f, "UPSTREAM_REJECTED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A recorded provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Failure classification.
    pub error: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

impl ProviderFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(error: FailureKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }
}

/// Outcome of asking one provider for a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    /// The provider returned a quote.
    Quoted(Quote),
    /// The provider failed.
    Failed(ProviderFailure),
}

impl ProviderOutcome {
    /// Returns the quote if the provider succeeded.
    #[must_use]
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Quoted(quote) => Some(quote),
            Self::Failed(_) => None,
        }
    }

    /// Returns the failure if the provider failed.
    #[must_use]
    pub fn failure(&self) -> Option<&ProviderFailure> {
        match self {
            Self::Quoted(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Returns true if the provider returned a quote.
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        matches!(self, Self::Quoted(_))
    }
}

/// The merged result of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    route: RouteKey,
    aggregated_at: Timestamp,
    prices: BTreeMap<ProviderId, ProviderOutcome>,
}

impl AggregateResult {
    /// Creates a result from collected outcomes.
    #[must_use]
    pub fn new(
        route: RouteKey,
        aggregated_at: Timestamp,
        prices: BTreeMap<ProviderId, ProviderOutcome>,
    ) -> Self {
        Self {
            route,
            aggregated_at,
            prices,
        }
    }

    /// Returns the route.
    #[inline]
    #[must_use]
    pub fn route(&self) -> &RouteKey {
        &self.route
    }

    /// Returns when the fan-out completed.
    #[inline]
    #[must_use]
    pub fn aggregated_at(&self) -> Timestamp {
        self.aggregated_at
    }

    /// Returns every provider outcome, ordered by provider name.
    #[inline]
    #[must_use]
    pub fn prices(&self) -> &BTreeMap<ProviderId, ProviderOutcome> {
        &self.prices
    }

    /// Returns the outcome for one provider.
    #[must_use]
    pub fn outcome(&self, provider: &ProviderId) -> Option<&ProviderOutcome> {
        self.prices.get(provider)
    }

    /// Returns all successful quotes.
    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.prices.values().filter_map(ProviderOutcome::quote)
    }

    /// Returns all failures with their provider.
    pub fn failures(&self) -> impl Iterator<Item = (&ProviderId, &ProviderFailure)> {
        self.prices
            .iter()
            .filter_map(|(id, outcome)| outcome.failure().map(|f| (id, f)))
    }

    /// Returns the number of providers that returned a quote.
    #[must_use]
    pub fn quoted_count(&self) -> usize {
        self.quotes().count()
    }

    /// Returns the number of providers that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.prices.len() - self.quoted_count()
    }

    /// Returns the lowest-priced quote, if any provider succeeded.
    #[must_use]
    pub fn cheapest(&self) -> Option<&Quote> {
        self.quotes().min_by_key(|q| q.price())
    }
}
