//! # Ride Providers
//!
//! Adapters for upstream ride providers.
//!
//! - [`traits::ProviderClient`]: the port every provider implements
//! - [`http_provider::HttpProvider`]: JSON estimate API
//! - [`mock::MockProvider`]: in-process fixture
//! - [`error::ProviderError`]: the four failure kinds

pub mod error;
pub mod http_client;
pub mod http_provider;
pub mod mock;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use http_provider::HttpProvider;
pub use mock::MockProvider;
pub use traits::ProviderClient;
