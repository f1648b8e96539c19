//! Redis-backed fixed-window counters.
//!
//! One key per window. INCR creates it, `PEXPIRE NX` pins the deadline on
//! the first increment only, and PTTL reports the time left. All three
//! run inside one MULTI/EXEC block, so concurrent callers observe
//! strictly increasing counts against a single reset deadline.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tavola_core::traits::{RateLimitStore, RepoResult, WindowCount};

use crate::error::map_cache_error;
use crate::pool::SharedRedisPool;

/// Key prefix for rate-limit windows
const RATE_LIMIT_KEY_PREFIX: &str = "ratelimit:";

fn window_key(key: &str) -> String {
    format!("{RATE_LIMIT_KEY_PREFIX}{key}")
}

/// Rate-limit counters backed by Redis with native window expiry
#[derive(Debug, Clone)]
pub struct RedisRateLimitStore {
    pool: SharedRedisPool,
}

impl RedisRateLimitStore {
    #[must_use]
    pub fn new(pool: SharedRedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(&self, key: &str, window: Duration) -> RepoResult<WindowCount> {
        let key = window_key(key);
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_cache_error)?;

        let (count, pttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("PEXPIRE")
            .arg(&key)
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .cmd("PTTL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(map_cache_error)?;

        // PTTL could only miss if the key expired mid-transaction, which
        // MULTI/EXEC rules out; fall back to a full window regardless.
        let remaining_ms = if pttl > 0 { pttl } else { window_ms };
        let reset_at = Utc::now() + chrono::Duration::milliseconds(remaining_ms);

        Ok(WindowCount { count, reset_at })
    }
}
