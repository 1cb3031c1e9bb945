//! # Provider Client Trait
//!
//! Port definition for upstream ride providers.
//!
//! Each upstream (a JSON API, a scraping sidecar, a fixture) implements
//! [`ProviderClient`]. The aggregator treats every implementation as a black
//! box that yields either a well-formed [`Quote`] or a typed
//! [`ProviderError`](super::error::ProviderError).
//!
//! # Examples
//!
//! ```ignore
//! use fare_compare::infrastructure::providers::traits::ProviderClient;
//!
//! struct MyProvider { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl ProviderClient for MyProvider {
//!     // ... implement required methods
//! }
//! ```

use crate::domain::entities::Quote;
use crate::domain::value_objects::{ProviderId, RouteKey, Timestamp};
use crate::infrastructure::providers::error::ProviderResult;
use async_trait::async_trait;
use std::fmt;

/// Trait implemented by every upstream ride provider.
///
/// # Error Handling
///
/// Implementations must map every failure into a
/// [`ProviderError`](super::error::ProviderError) and must not panic. The
/// aggregator still isolates panics at the task boundary, recording them as
/// `Unknown`.
#[async_trait]
pub trait ProviderClient: Send + Sync + fmt::Debug {
    /// Returns the provider name used as the key in aggregate results.
    fn provider_id(&self) -> &ProviderId;

    /// Fetches one quote for a route.
    ///
    /// `at` requests a scheduled pickup time; `None` means now.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Timeout` - the provider did not answer in time
    /// - `ProviderError::ParseFailure` - the answer could not be decoded
    /// - `ProviderError::UpstreamRejected` - the provider refused the request
    /// - `ProviderError::Unknown` - anything else
    async fn fetch_quote(&self, route: &RouteKey, at: Option<Timestamp>) -> ProviderResult<Quote>;
}
