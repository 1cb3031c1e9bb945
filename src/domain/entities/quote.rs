//! # Quote Entity
//!
//! A normalized fare quote from one provider.
//!
//! # Examples
//!
//! ```
//! use fare_compare::domain::entities::quote::QuoteBuilder;
//! use fare_compare::domain::value_objects::{Price, ProviderId};
//!
//! let quote = QuoteBuilder::new(ProviderId::new("uber"), Price::new(250.0).unwrap())
//!     .surge_multiplier(1.2)
//!     .estimate_minutes(15)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(quote.currency(), "INR");
//! assert!(quote.is_surging());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Price, ProviderId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency assumed when a provider does not report one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Surge multiplier meaning "no surge".
pub const NO_SURGE: f64 = 1.0;

/// A fare quote from a ride provider.
///
/// # Invariants
///
/// - Price is strictly positive
/// - Currency is a non-empty uppercase code
/// - Surge multiplier is finite and at least 1.0
///
/// Quotes are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    provider: ProviderId,
    price: Price,
    currency: String,
    surge_multiplier: f64,
    estimate_minutes: u32,
    captured_at: Timestamp,
}

impl Quote {
    /// Creates a quote with default currency, no surge and a zero ETA.
    ///
    /// # Errors
    ///
    /// Never fails for the defaults; kept fallible to match the builder.
    pub fn new(provider: ProviderId, price: Price) -> DomainResult<Self> {
        QuoteBuilder::new(provider, price).build()
    }

    /// Returns the provider that issued the quote.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Returns the quoted price.
    #[inline]
    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns the currency code.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the surge multiplier.
    #[inline]
    #[must_use]
    pub fn surge_multiplier(&self) -> f64 {
        self.surge_multiplier
    }

    /// Returns the estimated trip time in minutes.
    #[inline]
    #[must_use]
    pub fn estimate_minutes(&self) -> u32 {
        self.estimate_minutes
    }

    /// Returns when the quote was captured.
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Returns true if surge pricing applies.
    #[must_use]
    pub fn is_surging(&self) -> bool {
        self.surge_multiplier > NO_SURGE
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quote({}: {} {}",
            self.provider, self.price, self.currency
        )?;
        if self.is_surging() {
            write!(f, " x{}", self.surge_multiplier)?;
        }
        write!(f, ", {} min)", self.estimate_minutes)
    }
}

/// Builder for [`Quote`].
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    provider: ProviderId,
    price: Price,
    currency: String,
    surge_multiplier: f64,
    estimate_minutes: u32,
    captured_at: Option<Timestamp>,
}

impl QuoteBuilder {
    /// Starts a quote for the given provider and price.
    #[must_use]
    pub fn new(provider: ProviderId, price: Price) -> Self {
        Self {
            provider,
            price,
            currency: DEFAULT_CURRENCY.to_string(),
            surge_multiplier: NO_SURGE,
            estimate_minutes: 0,
            captured_at: None,
        }
    }

    /// Sets the currency code.
    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets the surge multiplier.
    #[must_use]
    pub fn surge_multiplier(mut self, surge: f64) -> Self {
        self.surge_multiplier = surge;
        self
    }

    /// Sets the estimated trip time.
    #[must_use]
    pub fn estimate_minutes(mut self, minutes: u32) -> Self {
        self.estimate_minutes = minutes;
        self
    }

    /// Overrides the capture time (defaults to now).
    #[must_use]
    pub fn captured_at(mut self, at: Timestamp) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Builds the quote.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuote`] if the currency is empty or
    /// the surge multiplier is below 1.0 or not finite.
    pub fn build(self) -> DomainResult<Quote> {
        let currency = self.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(DomainError::invalid_quote("currency is empty"));
        }
        if !self.surge_multiplier.is_finite() || self.surge_multiplier < NO_SURGE {
            return Err(DomainError::invalid_quote(format!(
                "surge multiplier {} must be at least {NO_SURGE}",
                self.surge_multiplier
            )));
        }

        Ok(Quote {
            provider: self.provider,
            price: self.price,
            currency,
            surge_multiplier: self.surge_multiplier,
            estimate_minutes: self.estimate_minutes,
            captured_at: self.captured_at.unwrap_or_else(Timestamp::now),
        })
    }
}
