//! In-process token revocation set

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tavola_core::traits::{RepoResult, RevocationStore};
use uuid::Uuid;

/// Revocation set with per-entry expiry.
///
/// Entries carry the revoked token's remaining lifetime; expired entries
/// are dropped lazily on lookup since an expired token fails validation
/// before the revocation check is ever consulted.
pub struct MemoryRevocationStore {
    entries: DashMap<Uuid, DateTime<Utc>>,
}

impl MemoryRevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Entries currently held, including not-yet-collected expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before - self.entries.len()
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRevocationStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> RepoResult<()> {
        let expires_at =
            Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self.entries.insert(jti, expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> RepoResult<bool> {
        let now = Utc::now();
        self.entries.remove_if(&jti, |_, expires_at| *expires_at <= now);
        Ok(self.entries.contains_key(&jti))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoked_jti_is_flagged() {
        let store = MemoryRevocationStore::new();
        let jti = Uuid::new_v4();

        assert!(!store.is_revoked(jti).await.unwrap());
        store.revoke(jti, Duration::from_secs(900)).await.unwrap();
        assert!(store.is_revoked(jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped_on_lookup() {
        let store = MemoryRevocationStore::new();
        let jti = Uuid::new_v4();

        store.revoke(jti, Duration::ZERO).await.unwrap();
        assert!(!store.is_revoked(jti).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = MemoryRevocationStore::new();
        let expired = Uuid::new_v4();
        let live = Uuid::new_v4();
        store.revoke(expired, Duration::ZERO).await.unwrap();
        store.revoke(live, Duration::from_secs(900)).await.unwrap();

        assert_eq!(store.sweep(), 1);
        assert!(store.is_revoked(live).await.unwrap());
    }
}
