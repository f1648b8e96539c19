//! In-process OTP storage
//!
//! Holds code records keyed by phone and purpose, the per-phone generation
//! counters, and the per-phone block list.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tavola_core::entities::{OtpPurpose, OtpRecord};
use tavola_core::traits::{OtpStore, RepoResult};
use tavola_core::DomainError;

use crate::window::WindowSlot;

/// OTP store backed by concurrent maps
pub struct MemoryOtpStore {
    codes: DashMap<(String, OtpPurpose), OtpRecord>,
    generations: DashMap<String, WindowSlot>,
    blocks: DashMap<String, DateTime<Utc>>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: DashMap::new(),
            generations: DashMap::new(),
            blocks: DashMap::new(),
        }
    }

    /// Number of stored code records
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for MemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryOtpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOtpStore")
            .field("codes", &self.codes.len())
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn find(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<Option<OtpRecord>> {
        Ok(self
            .codes
            .get(&(phone.to_string(), purpose))
            .map(|r| r.clone()))
    }

    async fn put(&self, record: &OtpRecord) -> RepoResult<()> {
        self.codes
            .insert((record.phone.clone(), record.purpose), record.clone());
        Ok(())
    }

    async fn delete(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<()> {
        self.codes.remove(&(phone.to_string(), purpose));
        Ok(())
    }

    async fn increment_attempts(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<u32> {
        let mut record = self
            .codes
            .get_mut(&(phone.to_string(), purpose))
            .ok_or(DomainError::OtpNotFound)?;
        record.attempts += 1;
        Ok(record.attempts)
    }

    async fn record_generation(&self, phone: &str, window: Duration) -> RepoResult<u64> {
        let now = Utc::now();
        let mut slot = self
            .generations
            .entry(phone.to_string())
            .or_insert_with(|| WindowSlot::open(now, window));
        Ok(slot.bump(now, window))
    }

    async fn block(&self, phone: &str, until: DateTime<Utc>) -> RepoResult<()> {
        self.blocks.insert(phone.to_string(), until);
        tracing::warn!(phone = %phone, until = %until, "Phone blocked for OTP");
        Ok(())
    }

    async fn blocked_until(&self, phone: &str) -> RepoResult<Option<DateTime<Utc>>> {
        let now = Utc::now();
        self.blocks
            .remove_if(&phone.to_string(), |_, until| *until <= now);
        Ok(self.blocks.get(phone).map(|u| *u))
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let before = self.codes.len();
        self.codes.retain(|_, record| !record.is_expired(now));
        Ok((before - self.codes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn sample_record(phone: &str, purpose: OtpPurpose) -> OtpRecord {
        OtpRecord::new(
            phone.to_string(),
            purpose,
            "digest".to_string(),
            Utc::now() + ChronoDuration::minutes(10),
        )
    }

    #[tokio::test]
    async fn test_put_find_delete() {
        let store = MemoryOtpStore::new();
        let record = sample_record("+14155550100", OtpPurpose::Login);

        store.put(&record).await.unwrap();
        assert!(store
            .find("+14155550100", OtpPurpose::Login)
            .await
            .unwrap()
            .is_some());

        store.delete("+14155550100", OtpPurpose::Login).await.unwrap();
        assert!(store
            .find("+14155550100", OtpPurpose::Login)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_purposes_do_not_collide() {
        let store = MemoryOtpStore::new();
        store
            .put(&sample_record("+14155550100", OtpPurpose::Login))
            .await
            .unwrap();

        assert!(store
            .find("+14155550100", OtpPurpose::PhoneVerify)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_increment_attempts() {
        let store = MemoryOtpStore::new();
        store
            .put(&sample_record("+14155550100", OtpPurpose::Login))
            .await
            .unwrap();

        assert_eq!(
            store
                .increment_attempts("+14155550100", OtpPurpose::Login)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .increment_attempts("+14155550100", OtpPurpose::Login)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_increment_attempts_without_record() {
        let store = MemoryOtpStore::new();
        assert!(matches!(
            store.increment_attempts("+1400", OtpPurpose::Login).await,
            Err(DomainError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn test_generation_counter() {
        let store = MemoryOtpStore::new();
        let window = Duration::from_secs(3600);

        for expected in 1..=6 {
            let total = store
                .record_generation("+14155550100", window)
                .await
                .unwrap();
            assert_eq!(total, expected);
        }
    }

    #[tokio::test]
    async fn test_block_lifts_after_deadline() {
        let store = MemoryOtpStore::new();

        store
            .block("+14155550100", Utc::now() + ChronoDuration::hours(24))
            .await
            .unwrap();
        assert!(store.blocked_until("+14155550100").await.unwrap().is_some());

        store
            .block("+14155550200", Utc::now() - ChronoDuration::seconds(1))
            .await
            .unwrap();
        assert!(store.blocked_until("+14155550200").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_expired() {
        let store = MemoryOtpStore::new();
        let mut expired = sample_record("+14155550100", OtpPurpose::Login);
        expired.expires_at = Utc::now() - ChronoDuration::minutes(1);
        store.put(&expired).await.unwrap();
        store
            .put(&sample_record("+14155550200", OtpPurpose::Login))
            .await
            .unwrap();

        let removed = store.clear_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
    }
}
