//! # Price History
//!
//! Persisted quote observations and the routes they belong to.

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{Price, ProviderId, RouteId, RouteKey, Timestamp};
use serde::{Deserialize, Serialize};

/// A route that has been priced at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Stable route id.
    pub id: RouteId,
    /// Pickup location as first seen.
    pub pickup_location: String,
    /// Dropoff location as first seen.
    pub dropoff_location: String,
    /// When the route was first recorded.
    pub created_at: Timestamp,
}

impl RouteSummary {
    /// Creates a summary for a route first seen at `created_at`.
    #[must_use]
    pub fn from_route(route: &RouteKey, created_at: Timestamp) -> Self {
        Self {
            id: route.id(),
            pickup_location: route.pickup_display().to_string(),
            dropoff_location: route.dropoff_display().to_string(),
            created_at,
        }
    }
}

/// One stored quote observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryRecord {
    /// Route the quote was taken for.
    pub route_id: RouteId,
    /// Provider that issued the quote.
    pub service_provider: ProviderId,
    /// Quoted price.
    pub price: Price,
    /// Currency code.
    pub currency: String,
    /// Surge multiplier at capture time.
    pub surge_multiplier: f64,
    /// Estimated trip minutes.
    pub estimate_minutes: u32,
    /// When the quote was captured.
    pub timestamp: Timestamp,
}

impl PriceHistoryRecord {
    /// Builds a record from a quote.
    #[must_use]
    pub fn from_quote(route_id: RouteId, quote: &Quote) -> Self {
        Self {
            route_id,
            service_provider: quote.provider().clone(),
            price: quote.price(),
            currency: quote.currency().to_string(),
            surge_multiplier: quote.surge_multiplier(),
            estimate_minutes: quote.estimate_minutes(),
            timestamp: quote.captured_at(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::quote::QuoteBuilder;

    #[test]
    fn record_copies_quote_fields() {
        let route = RouteKey::new("Koramangala", "Indiranagar");
        let quote = QuoteBuilder::new(ProviderId::new("uber"), Price::new(250.0).unwrap())
            .surge_multiplier(1.3)
            .estimate_minutes(20)
            .build()
            .unwrap();

        let record = PriceHistoryRecord::from_quote(route.id(), &quote);
        assert_eq!(record.route_id.as_str(), "koramangala|indiranagar");
        assert_eq!(record.service_provider.as_str(), "uber");
        assert_eq!(record.estimate_minutes, 20);
        assert_eq!(record.timestamp, quote.captured_at());
    }

    #[test]
    fn summary_uses_display_spelling() {
        let route = RouteKey::new("Koramangala", "Indiranagar");
        let summary = RouteSummary::from_route(&route, Timestamp::now());
        assert_eq!(summary.pickup_location, "Koramangala");
        assert_eq!(summary.id, route.id());
    }
}
