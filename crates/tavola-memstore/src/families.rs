//! In-process token family store
//!
//! The rotation compare-and-swap runs under the family entry's lock, so
//! concurrent refreshes with the same jti resolve to exactly one winner.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tavola_core::entities::TokenFamily;
use tavola_core::traits::{RepoResult, RotationOutcome, TokenFamilyStore};
use tavola_core::value_objects::{FamilyId, SessionId, UserId};
use tavola_core::DomainError;
use uuid::Uuid;

/// Token family store backed by concurrent maps
pub struct MemoryTokenFamilyStore {
    families: DashMap<FamilyId, TokenFamily>,
    user_families: DashMap<UserId, HashSet<FamilyId>>,
    session_families: DashMap<SessionId, HashSet<FamilyId>>,
}

impl MemoryTokenFamilyStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
            user_families: DashMap::new(),
            session_families: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl Default for MemoryTokenFamilyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryTokenFamilyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenFamilyStore")
            .field("families", &self.families.len())
            .finish()
    }
}

#[async_trait]
impl TokenFamilyStore for MemoryTokenFamilyStore {
    async fn insert(&self, family: &TokenFamily) -> RepoResult<()> {
        if self.families.contains_key(&family.id) {
            return Err(DomainError::FamilyAlreadyExists(family.id));
        }

        self.user_families
            .entry(family.user_id)
            .or_default()
            .insert(family.id);
        self.session_families
            .entry(family.session_id)
            .or_default()
            .insert(family.id);
        self.families.insert(family.id, family.clone());

        tracing::debug!(family_id = %family.id, user_id = %family.user_id, "Token family opened");
        Ok(())
    }

    async fn find_by_id(&self, id: FamilyId) -> RepoResult<Option<TokenFamily>> {
        Ok(self.families.get(&id).map(|f| f.clone()))
    }

    async fn rotate_jti(
        &self,
        id: FamilyId,
        expected: Uuid,
        next: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<RotationOutcome> {
        let mut family = self
            .families
            .get_mut(&id)
            .ok_or(DomainError::FamilyNotFound(id))?;

        if family.revoked {
            return Ok(RotationOutcome::FamilyRevoked);
        }
        if family.current_jti != expected {
            return Ok(RotationOutcome::Mismatch {
                actual: family.current_jti,
            });
        }

        family.current_jti = next;
        family.rotated_at = at;
        Ok(RotationOutcome::Rotated)
    }

    async fn revoke(&self, id: FamilyId) -> RepoResult<()> {
        let mut family = self
            .families
            .get_mut(&id)
            .ok_or(DomainError::FamilyNotFound(id))?;
        family.revoked = true;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> RepoResult<u64> {
        let ids: Vec<FamilyId> = self
            .user_families
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut revoked = 0;
        for id in ids {
            if let Some(mut family) = self.families.get_mut(&id) {
                if !family.revoked {
                    family.revoked = true;
                    revoked += 1;
                }
            }
        }

        if revoked > 0 {
            tracing::debug!(user_id = %user_id, revoked, "User token families revoked");
        }
        Ok(revoked)
    }

    async fn revoke_for_session(&self, session_id: SessionId) -> RepoResult<u64> {
        let ids: Vec<FamilyId> = self
            .session_families
            .get(&session_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut revoked = 0;
        for id in ids {
            if let Some(mut family) = self.families.get_mut(&id) {
                if !family.revoked {
                    family.revoked = true;
                    revoked += 1;
                }
            }
        }

        Ok(revoked)
    }
}
