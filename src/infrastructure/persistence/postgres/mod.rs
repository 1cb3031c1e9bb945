//! # PostgreSQL Repositories

pub mod price_history_repository;

pub use price_history_repository::PostgresPriceHistoryRepository;
