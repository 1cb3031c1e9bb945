//! # Sliding-Window Stores
//!
//! Storage behind per-client rate limiting.

pub mod in_memory;
pub mod redis;
pub mod traits;

pub use in_memory::InMemoryTokenWindow;
pub use self::redis::RedisTokenWindow;
pub use traits::{TokenWindow, WindowError, WindowOutcome, WindowResult};
