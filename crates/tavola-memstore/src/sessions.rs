//! In-process session store

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tavola_core::entities::Session;
use tavola_core::traits::{RepoResult, SessionStore};
use tavola_core::value_objects::{SessionId, UserId};
use tavola_core::DomainError;

/// Session store backed by concurrent maps.
///
/// A per-user index makes user-wide revocation a walk over that user's
/// sessions only. Field updates (`touch`, `revoke`) go through `get_mut`,
/// which holds the entry lock for the duration of the change.
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, Session>,
    user_sessions: DashMap<UserId, HashSet<SessionId>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            user_sessions: DashMap::new(),
        }
    }

    /// Number of stored sessions, live and revoked
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("sessions", &self.sessions.len())
            .field("users", &self.user_sessions.len())
            .finish()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> RepoResult<()> {
        if self.sessions.contains_key(&session.id) {
            return Err(DomainError::SessionAlreadyExists(session.id));
        }

        self.user_sessions
            .entry(session.user_id)
            .or_default()
            .insert(session.id);
        self.sessions.insert(session.id, session.clone());

        tracing::debug!(session_id = %session.id, user_id = %session.user_id, "Session inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> RepoResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Session>> {
        let Some(ids) = self.user_sessions.get(&user_id) else {
            return Ok(Vec::new());
        };

        let mut sessions: Vec<Session> = ids
            .iter()
            .filter_map(|id| self.sessions.get(id).map(|s| s.clone()))
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn touch(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        // Activity timestamps only move forward
        if at > session.last_activity_at {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn revoke(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        if session.is_live() {
            session.revoke(at);
        }
        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let ids: Vec<SessionId> = self
            .user_sessions
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut revoked = 0;
        for id in ids {
            if keep == Some(id) {
                continue;
            }
            if let Some(mut session) = self.sessions.get_mut(&id) {
                if session.is_live() {
                    session.revoke(at);
                    revoked += 1;
                }
            }
        }

        if revoked > 0 {
            tracing::debug!(user_id = %user_id, revoked, "User sessions revoked");
        }
        Ok(revoked)
    }

    async fn revoke_idle_since(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let now = Utc::now();
        let mut revoked = 0;

        for mut entry in self.sessions.iter_mut() {
            if entry.is_live() && entry.idle_since(cutoff) {
                entry.revoke(now);
                revoked += 1;
            }
        }

        Ok(revoked)
    }
}
