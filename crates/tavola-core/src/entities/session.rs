//! Session entity - one device login
//!
//! Sessions are revoked, never deleted; the row stays behind as evidence
//! and keeps replayed tokens attributable.

use chrono::{DateTime, Utc};

use crate::value_objects::{SessionId, TenantId, UserId};

/// A device login for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub tenant_id: TenantId,
    /// Hex sha-256 digest of client signals, when the client supplied them
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a live session with a generated id
    pub fn new(user_id: UserId, tenant_id: TenantId, fingerprint: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id,
            tenant_id,
            fingerprint,
            created_at: now,
            last_activity_at: now,
            revoked: false,
            revoked_at: None,
        }
    }

    /// A session is live when it has not been revoked
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.revoked
    }

    /// Whether the session has been idle since before `cutoff`
    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity_at < cutoff
    }

    /// Mark the session revoked at `at`
    pub fn revoke(&mut self, at: DateTime<Utc>) {
        self.revoked = true;
        self.revoked_at = Some(at);
    }
}
