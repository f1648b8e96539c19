//! Redis-backed one-time code storage.
//!
//! Code records, wrong-attempt counters, generation counters, and phone
//! blocks each live under their own key prefix. Every key carries a TTL,
//! so expiry is handled by Redis and `clear_expired` has nothing to do.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tavola_core::entities::{OtpPurpose, OtpRecord};
use tavola_core::traits::{OtpStore, RepoResult};
use tavola_core::DomainError;

use crate::error::map_cache_error;
use crate::pool::SharedRedisPool;

/// Key prefix for stored code records
const OTP_CODE_PREFIX: &str = "otp:code:";

/// Key prefix for wrong-attempt counters
const OTP_ATTEMPTS_PREFIX: &str = "otp:attempts:";

/// Key prefix for per-phone generation counters
const OTP_GENERATION_PREFIX: &str = "otp:gen:";

/// Key prefix for per-phone blocks
const OTP_BLOCK_PREFIX: &str = "otp:block:";

fn code_key(phone: &str, purpose: OtpPurpose) -> String {
    format!("{OTP_CODE_PREFIX}{}:{phone}", purpose.as_str())
}

fn attempts_key(phone: &str, purpose: OtpPurpose) -> String {
    format!("{OTP_ATTEMPTS_PREFIX}{}:{phone}", purpose.as_str())
}

fn generation_key(phone: &str) -> String {
    format!("{OTP_GENERATION_PREFIX}{phone}")
}

fn block_key(phone: &str) -> String {
    format!("{OTP_BLOCK_PREFIX}{phone}")
}

/// OTP store backed by Redis keys with native expiry
#[derive(Debug, Clone)]
pub struct RedisOtpStore {
    pool: SharedRedisPool,
}

impl RedisOtpStore {
    #[must_use]
    pub fn new(pool: SharedRedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn find(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<Option<OtpRecord>> {
        let mut conn = self.pool.get().await.map_err(map_cache_error)?;
        let raw: Option<String> = conn
            .get(code_key(phone, purpose))
            .await
            .map_err(map_cache_error)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let mut record: OtpRecord = serde_json::from_str(&raw).map_err(map_cache_error)?;

        // The wrong-attempt count lives in its own key; fold it back in
        let attempts: Option<u32> = conn
            .get(attempts_key(phone, purpose))
            .await
            .map_err(map_cache_error)?;
        record.attempts = attempts.unwrap_or(0);

        Ok(Some(record))
    }

    async fn put(&self, record: &OtpRecord) -> RepoResult<()> {
        let ttl_seconds = (record.expires_at - Utc::now()).num_seconds().max(1) as u64;
        self.pool
            .set(
                &code_key(&record.phone, record.purpose),
                record,
                Some(ttl_seconds),
            )
            .await
            .map_err(map_cache_error)?;

        // A fresh code starts the attempt count over
        self.pool
            .delete(&attempts_key(&record.phone, record.purpose))
            .await
            .map_err(map_cache_error)?;

        Ok(())
    }

    async fn delete(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<()> {
        let mut conn = self.pool.get().await.map_err(map_cache_error)?;
        let _: i32 = conn
            .del(vec![code_key(phone, purpose), attempts_key(phone, purpose)])
            .await
            .map_err(map_cache_error)?;
        Ok(())
    }

    async fn increment_attempts(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<u32> {
        let mut conn = self.pool.get().await.map_err(map_cache_error)?;

        // The counter is meaningless without a live code; bind its TTL to
        // the code key so both vanish together.
        let code_ttl_ms: i64 = conn
            .pttl(code_key(phone, purpose))
            .await
            .map_err(map_cache_error)?;
        if code_ttl_ms == -2 {
            return Err(DomainError::OtpNotFound);
        }

        let key = attempts_key(phone, purpose);
        let attempts: u32 = conn.incr(&key, 1u32).await.map_err(map_cache_error)?;
        if code_ttl_ms > 0 {
            let _: bool = conn
                .pexpire(&key, code_ttl_ms)
                .await
                .map_err(map_cache_error)?;
        }

        Ok(attempts)
    }

    async fn record_generation(&self, phone: &str, window: Duration) -> RepoResult<u64> {
        let key = generation_key(phone);
        let window_seconds = i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_cache_error)?;

        let (total,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(window_seconds)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(map_cache_error)?;

        Ok(total)
    }

    async fn block(&self, phone: &str, until: DateTime<Utc>) -> RepoResult<()> {
        let ttl_seconds = (until - Utc::now()).num_seconds();
        if ttl_seconds <= 0 {
            return Ok(());
        }
        self.pool
            .set(&block_key(phone), &until, Some(ttl_seconds as u64))
            .await
            .map_err(map_cache_error)?;
        tracing::warn!(phone = %phone, until = %until, "Phone blocked for OTP");
        Ok(())
    }

    async fn blocked_until(&self, phone: &str) -> RepoResult<Option<DateTime<Utc>>> {
        self.pool
            .get_value(&block_key(phone))
            .await
            .map_err(map_cache_error)
    }

    async fn clear_expired(&self, _now: DateTime<Utc>) -> RepoResult<u64> {
        // Redis expires code keys on its own
        Ok(0)
    }
}
