//! # Persistence Layer
//!
//! Price history storage.
//!
//! ## Ports
//!
//! - [`PersistenceSink`]: records successful quotes
//! - [`PriceHistoryRepository`]: serves routes, history and trends
//!
//! ## Implementations
//!
//! - `in_memory`: for tests and storage-less runs
//! - `postgres`: sqlx over PostgreSQL

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use in_memory::InMemoryPriceHistoryRepository;
pub use postgres::PostgresPriceHistoryRepository;
pub use traits::{
    HistoryQuery, PersistenceSink, PriceHistoryRepository, RepositoryError, RepositoryResult,
};
