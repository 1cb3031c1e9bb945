//! # Response Cache
//!
//! TTL storage for recently answered route queries.

pub mod in_memory;
pub mod redis;
pub mod traits;

pub use self::redis::RedisResponseCache;
pub use in_memory::InMemoryResponseCache;
pub use traits::{CacheError, CacheResult, ResponseCache};
