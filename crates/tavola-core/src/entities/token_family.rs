//! Token family entity - the rotation chain of one refresh token line
//!
//! A family is created at login and survives every rotation. Exactly one
//! refresh jti is valid per family at any time; presenting any other jti
//! from the chain is the reuse signal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::value_objects::{FamilyId, SessionId, TenantId, UserId};

/// Refresh-token family bound to one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFamily {
    pub id: FamilyId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    /// The only refresh jti this family currently accepts
    pub current_jti: Uuid,
    /// Fingerprint captured at login, compared on every rotation
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub rotated_at: DateTime<Utc>,
    pub revoked: bool,
}

impl TokenFamily {
    /// Open a new family whose first valid jti is `current_jti`
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        tenant_id: TenantId,
        current_jti: Uuid,
        fingerprint: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: FamilyId::generate(),
            user_id,
            session_id,
            tenant_id,
            current_jti,
            fingerprint,
            created_at: now,
            rotated_at: now,
            revoked: false,
        }
    }

    /// Whether `jti` is the family's currently valid refresh jti
    #[inline]
    pub fn accepts(&self, jti: Uuid) -> bool {
        !self.revoked && self.current_jti == jti
    }
}
