//! Redis-backed revocation set.
//!
//! Each revoked jti becomes one key whose TTL is the token's remaining
//! lifetime, so the set never holds more entries than there are live
//! tokens and needs no sweeper.

use std::time::Duration;

use async_trait::async_trait;
use tavola_core::traits::{RepoResult, RevocationStore};
use uuid::Uuid;

use crate::error::map_cache_error;
use crate::pool::SharedRedisPool;

/// Key prefix for revoked token ids
const REVOKED_KEY_PREFIX: &str = "revoked:";

fn revoked_key(jti: Uuid) -> String {
    format!("{REVOKED_KEY_PREFIX}{jti}")
}

/// Revocation set backed by Redis keys with native expiry
#[derive(Debug, Clone)]
pub struct RedisRevocationStore {
    pool: SharedRedisPool,
}

impl RedisRevocationStore {
    #[must_use]
    pub fn new(pool: SharedRedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> RepoResult<()> {
        // SET rejects a zero TTL; clamp so a token on the edge of expiry
        // still lands in the set.
        let ttl_seconds = ttl.as_secs().max(1);
        self.pool
            .set(&revoked_key(jti), &true, Some(ttl_seconds))
            .await
            .map_err(map_cache_error)
    }

    async fn is_revoked(&self, jti: Uuid) -> RepoResult<bool> {
        self.pool
            .exists(&revoked_key(jti))
            .await
            .map_err(map_cache_error)
    }
}
