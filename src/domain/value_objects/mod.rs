//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! - [`ClientIdentity`], [`ProviderId`], [`RouteId`]: string identifiers
//! - [`RouteKey`]: normalized (pickup, dropoff) pair
//! - [`Price`]: positive decimal amount
//! - [`Timestamp`]: UTC point in time

pub mod ids;
pub mod price;
pub mod route_key;
pub mod timestamp;

pub use ids::{ClientIdentity, ProviderId, RouteId};
pub use price::Price;
pub use route_key::RouteKey;
pub use timestamp::Timestamp;
