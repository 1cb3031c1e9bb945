//! # Price Trends
//!
//! Per-provider price statistics over a window of history records.
//!
//! # Examples
//!
//! ```
//! use fare_compare::domain::services::price_trend::ProviderTrend;
//!
//! let trend = ProviderTrend::default();
//! assert_eq!(trend.average, 0.0);
//! assert!(trend.prices.is_empty());
//! ```

use crate::domain::entities::PriceHistoryRecord;
use crate::domain::value_objects::{ProviderId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One price observation inside a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// When the price was observed.
    pub timestamp: Timestamp,
    /// Observed price.
    pub price: f64,
    /// Surge multiplier at the time.
    pub surge_multiplier: f64,
}

/// Price statistics for one provider.
///
/// `average`, `max` and `min` are zero when there are no points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderTrend {
    /// Observations in ascending time order.
    pub prices: Vec<TrendPoint>,
    /// Mean price.
    pub average: f64,
    /// Highest price.
    pub max: f64,
    /// Lowest price.
    pub min: f64,
}

impl ProviderTrend {
    fn from_points(mut prices: Vec<TrendPoint>) -> Self {
        if prices.is_empty() {
            return Self::default();
        }
        prices.sort_by_key(|p| p.timestamp);

        let sum: f64 = prices.iter().map(|p| p.price).sum();
        let max = prices.iter().map(|p| p.price).fold(f64::MIN, f64::max);
        let min = prices.iter().map(|p| p.price).fold(f64::MAX, f64::min);
        let average = sum / prices.len() as f64;

        Self {
            prices,
            average,
            max,
            min,
        }
    }
}

/// Groups history records by provider and computes a trend for each.
///
/// Every provider in `providers` appears in the output, even without
/// records, so callers can render a stable set of series.
#[must_use]
pub fn compute_trends(
    records: &[PriceHistoryRecord],
    providers: &[ProviderId],
) -> BTreeMap<ProviderId, ProviderTrend> {
    let mut grouped: BTreeMap<ProviderId, Vec<TrendPoint>> = providers
        .iter()
        .map(|p| (p.clone(), Vec::new()))
        .collect();

    for record in records {
        grouped
            .entry(record.service_provider.clone())
            .or_default()
            .push(TrendPoint {
                timestamp: record.timestamp,
                price: record.price.to_f64(),
                surge_multiplier: record.surge_multiplier,
            });
    }

    grouped
        .into_iter()
        .map(|(provider, points)| (provider, ProviderTrend::from_points(points)))
        .collect()
}
