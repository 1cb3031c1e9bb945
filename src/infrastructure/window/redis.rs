//! # Redis Token Window
//!
//! [`TokenWindow`] shared across service instances. Each key is a sorted set
//! of admission timestamps; a Lua script runs the prune, count, insert and
//! expiry as one server-side step.

use super::traits::{TokenWindow, WindowError, WindowOutcome, WindowResult, window_millis};
use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// KEYS[1] = window key
/// ARGV = now_ms, window_ms, capacity, member
/// Returns {admitted, count, oldest_ms or -1}.
const ACQUIRE_SCRIPT: &str = r"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local capacity = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', '(' .. (now - window))
local count = redis.call('ZCARD', key)
local oldest = -1
local first = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if first[2] then
  oldest = tonumber(first[2])
end

if count >= capacity then
  return {0, count, oldest}
end

redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return {1, count, oldest}
";

/// Redis-backed sliding-window counter.
#[derive(Clone)]
pub struct RedisTokenWindow {
    connection: ConnectionManager,
    script: Script,
}

impl fmt::Debug for RedisTokenWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTokenWindow").finish_non_exhaustive()
    }
}

impl RedisTokenWindow {
    /// Creates a window store over an established connection.
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            script: Script::new(ACQUIRE_SCRIPT),
        }
    }
}

fn to_window_error(error: redis::RedisError) -> WindowError {
    if error.is_io_error() || error.is_connection_dropped() || error.is_timeout() {
        WindowError::connection(error.to_string())
    } else {
        WindowError::protocol(error.to_string())
    }
}

#[async_trait]
impl TokenWindow for RedisTokenWindow {
    #[instrument(skip(self), level = "debug")]
    async fn try_acquire(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        capacity: u32,
    ) -> WindowResult<WindowOutcome> {
        // Two admissions in the same millisecond must not collapse into one
        // sorted-set member.
        let member = format!("{}-{}", now_ms, Uuid::new_v4());
        let mut connection = self.connection.clone();

        let (admitted, count, oldest): (i64, i64, i64) = self
            .script
            .key(key)
            .arg(now_ms)
            .arg(window_millis(window))
            .arg(capacity)
            .arg(member)
            .invoke_async(&mut connection)
            .await
            .map_err(to_window_error)?;

        Ok(WindowOutcome {
            admitted: admitted == 1,
            count: u32::try_from(count)
                .map_err(|_| WindowError::protocol(format!("invalid count {}", count)))?,
            oldest_ms: (oldest >= 0).then_some(oldest),
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn count(&self, key: &str, now_ms: i64, window: Duration) -> WindowResult<u32> {
        let cutoff = now_ms.saturating_sub(window_millis(window));
        let mut connection = self.connection.clone();

        let count: i64 = redis::cmd("ZCOUNT")
            .arg(key)
            .arg(cutoff)
            .arg("+inf")
            .query_async(&mut connection)
            .await
            .map_err(to_window_error)?;

        u32::try_from(count).map_err(|_| WindowError::protocol(format!("invalid count {}", count)))
    }
}
