//! # Application Layer
//!
//! Use-case orchestration: admission, aggregation, retry.

pub mod error;
pub mod services;

pub use error::{AggregationError, GovernorError};
