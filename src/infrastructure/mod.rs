//! # Infrastructure Layer
//!
//! Adapters for external systems.
//!
//! - [`providers`]: upstream fare APIs
//! - [`window`]: sliding-window stores for rate limiting
//! - [`cache`]: response cache
//! - [`persistence`]: price history storage
//! - [`sweeper`]: periodic cleanup of the in-memory stores

pub mod cache;
pub mod persistence;
pub mod providers;
pub mod sweeper;
pub mod window;
