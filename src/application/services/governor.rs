//! # Request Governor
//!
//! Entry point for fare lookups: admission first, then aggregation.
//!
//! A rejected request fails fast with [`GovernorError::RateLimited`] and
//! never reaches the cache or any provider.

use crate::application::error::GovernorError;
use crate::application::services::aggregator::Aggregator;
use crate::application::services::rate_limiter::{Admission, RateLimiter};
use crate::domain::entities::AggregateResult;
use crate::domain::value_objects::{ClientIdentity, RouteKey, Timestamp};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of a governed request, with the admission that let it through.
#[derive(Debug, Clone)]
pub struct GovernedResult {
    /// Admission granted to the caller.
    pub admission: Admission,
    /// Aggregated fares.
    pub result: AggregateResult,
}

/// Rate-limited front door to the aggregator.
#[derive(Debug, Clone)]
pub struct RequestGovernor {
    limiter: Arc<RateLimiter>,
    aggregator: Arc<Aggregator>,
}

impl RequestGovernor {
    /// Creates a governor.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>, aggregator: Arc<Aggregator>) -> Self {
        Self {
            limiter,
            aggregator,
        }
    }

    /// Returns the rate limiter.
    #[inline]
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Returns the aggregator.
    #[inline]
    #[must_use]
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Admits `identity` and aggregates quotes for `route`.
    ///
    /// # Errors
    ///
    /// - `GovernorError::RateLimited` if the identity is over its budget
    /// - `GovernorError::InvalidRoute` if the route fails validation
    /// - `GovernorError::DependencyUnavailable` if a shared store fails
    pub async fn handle(
        &self,
        identity: &ClientIdentity,
        route: &RouteKey,
    ) -> Result<AggregateResult, GovernorError> {
        self.handle_request(identity, route, None)
            .await
            .map(|governed| governed.result)
    }

    /// Like [`RequestGovernor::handle`], for a ride at `at`, returning the
    /// admission alongside the result.
    ///
    /// # Errors
    ///
    /// See [`RequestGovernor::handle`].
    #[instrument(skip(self, identity, route), fields(identity = %identity, route = %route))]
    pub async fn handle_request(
        &self,
        identity: &ClientIdentity,
        route: &RouteKey,
        at: Option<Timestamp>,
    ) -> Result<GovernedResult, GovernorError> {
        let admission = self.limiter.admit(identity).await?;
        if !admission.allowed {
            info!(limit = admission.limit, "rate limit exceeded");
            return Err(GovernorError::rate_limited(
                admission.retry_after.unwrap_or_default(),
                admission.limit,
                admission.reset_at,
            ));
        }

        let result = self.aggregator.aggregate_at(route, at).await?;
        Ok(GovernedResult { admission, result })
    }
}
