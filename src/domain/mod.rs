//! # Domain Layer
//!
//! Routes, quotes and aggregation results, independent of any transport or
//! storage.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
