//! # Route Key
//!
//! Normalized (pickup, dropoff) pair.
//!
//! A [`RouteKey`] is both the unit of aggregation and the cache key. Two
//! locations that differ only in case or whitespace normalize identically,
//! so `" Koramangala "` and `"koramangala"` address the same cache entry.
//!
//! # Examples
//!
//! ```
//! use fare_compare::domain::value_objects::route_key::RouteKey;
//!
//! let a = RouteKey::new("Koramangala", "Indiranagar");
//! let b = RouteKey::new("  koramangala ", "INDIRANAGAR");
//! assert_eq!(a, b);
//! assert_eq!(a.id().as_str(), "koramangala|indiranagar");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::ids::RouteId;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Normalizes a free-text location: trims, collapses whitespace runs and
/// lowercases.
#[must_use]
pub fn normalize_location(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Escapes the key separators (`|`, `@`) and the escape character itself so
/// that joined components cannot collide.
fn escape_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            '@' => out.push_str("%40"),
            other => out.push(other),
        }
    }
    out
}

/// A normalized route between two free-text locations.
///
/// Equality and hashing only consider the normalized form; the caller's
/// original spelling is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RouteRepr", into = "RouteRepr")]
pub struct RouteKey {
    pickup: String,
    dropoff: String,
    pickup_display: String,
    dropoff_display: String,
}

impl RouteKey {
    /// Creates a route key from raw caller input.
    ///
    /// Construction never fails; use [`RouteKey::validate`] before
    /// aggregating.
    #[must_use]
    pub fn new(pickup: impl AsRef<str>, dropoff: impl AsRef<str>) -> Self {
        let pickup = pickup.as_ref();
        let dropoff = dropoff.as_ref();
        Self {
            pickup: normalize_location(pickup),
            dropoff: normalize_location(dropoff),
            pickup_display: pickup.trim().to_string(),
            dropoff_display: dropoff.trim().to_string(),
        }
    }

    /// Checks that the route can be priced.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRoute`] if either location is empty or
    /// both normalize to the same place.
    pub fn validate(&self) -> DomainResult<()> {
        if self.pickup.is_empty() {
            return Err(DomainError::invalid_route("pickup location is empty"));
        }
        if self.dropoff.is_empty() {
            return Err(DomainError::invalid_route("dropoff location is empty"));
        }
        if self.pickup == self.dropoff {
            return Err(DomainError::invalid_route(
                "pickup and dropoff are the same location",
            ));
        }
        Ok(())
    }

    /// Returns the normalized pickup location.
    #[inline]
    #[must_use]
    pub fn pickup(&self) -> &str {
        &self.pickup
    }

    /// Returns the normalized dropoff location.
    #[inline]
    #[must_use]
    pub fn dropoff(&self) -> &str {
        &self.dropoff
    }

    /// Returns the pickup as the caller spelled it.
    #[inline]
    #[must_use]
    pub fn pickup_display(&self) -> &str {
        &self.pickup_display
    }

    /// Returns the dropoff as the caller spelled it.
    #[inline]
    #[must_use]
    pub fn dropoff_display(&self) -> &str {
        &self.dropoff_display
    }

    /// Returns the stable route id: `pickup|dropoff` with `%`, `|` and `@`
    /// percent-escaped in each location.
    #[must_use]
    pub fn id(&self) -> RouteId {
        RouteId::new(format!(
            "{}|{}",
            escape_component(&self.pickup),
            escape_component(&self.dropoff)
        ))
    }

    /// Returns the cache key for this route, optionally pinned to a
    /// scheduled pickup time (second precision).
    #[must_use]
    pub fn cache_key(&self, at: Option<Timestamp>) -> String {
        let id = self.id();
        match at {
            Some(ts) => format!("{}@{}", id, ts.timestamp_secs()),
            None => id.to_string(),
        }
    }
}

impl PartialEq for RouteKey {
    fn eq(&self, other: &Self) -> bool {
        self.pickup == other.pickup && self.dropoff == other.dropoff
    }
}

impl Eq for RouteKey {}

impl Hash for RouteKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pickup.hash(state);
        self.dropoff.hash(state);
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pickup_display, self.dropoff_display)
    }
}

/// Wire form of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteRepr {
    pickup: String,
    dropoff: String,
}

impl From<RouteRepr> for RouteKey {
    fn from(repr: RouteRepr) -> Self {
        Self::new(repr.pickup, repr.dropoff)
    }
}

impl From<RouteKey> for RouteRepr {
    fn from(key: RouteKey) -> Self {
        Self {
            pickup: key.pickup_display,
            dropoff: key.dropoff_display,
        }
    }
}
