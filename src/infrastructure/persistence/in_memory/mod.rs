//! # In-Memory Repositories
//!
//! Storage-free implementations for tests and local runs.

pub mod price_history_repository;

pub use price_history_repository::InMemoryPriceHistoryRepository;
