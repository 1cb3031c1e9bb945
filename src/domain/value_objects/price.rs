//! # Price Value Object
//!
//! Positive decimal fare amount.

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive fare amount.
///
/// Backed by [`Decimal`] and serialized as a JSON number.
///
/// # Examples
///
/// ```
/// use fare_compare::domain::value_objects::Price;
///
/// let price = Price::new(250.0).unwrap();
/// assert_eq!(price.to_string(), "250");
/// assert!(Price::new(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Creates a price from a float.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPrice`] if the value is not finite or
    /// not strictly positive.
    pub fn new(value: f64) -> DomainResult<Self> {
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| DomainError::invalid_price(format!("{value} is not representable")))?;
        Self::from_decimal(decimal)
    }

    /// Creates a price from a decimal.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPrice`] if the value is not strictly
    /// positive.
    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::invalid_price(format!(
                "{value} must be greater than zero"
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Returns the decimal amount.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Decimal {
        self.0
    }

    /// Returns the amount as a float, for statistics.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
