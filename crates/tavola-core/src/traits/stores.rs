//! Store traits (ports) - define the interface for persistence
//!
//! The domain layer defines what it needs from storage; the backend crates
//! (PostgreSQL, Redis, in-process) provide the implementations. Everything
//! that must be atomic (jti rotation, counter increments) is atomic at the
//! store boundary, so services never need cross-call locks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{AuditLogEntry, OtpPurpose, OtpRecord, Session, Severity, TokenFamily, User};
use crate::error::DomainError;
use crate::value_objects::{FamilyId, Role, SessionId, TenantId, UserId};

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with their credential hash
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Find user by normalized phone within a tenant
    async fn find_by_phone(&self, tenant_id: TenantId, phone: &str) -> RepoResult<Option<User>>;

    /// Check if a normalized phone is already registered in a tenant
    async fn phone_exists(&self, tenant_id: TenantId, phone: &str) -> RepoResult<bool>;

    /// Get credential hash for authentication
    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>>;

    /// Update the user's role
    async fn update_role(&self, id: UserId, role: Role) -> RepoResult<()>;
}

// ============================================================================
// Session Store
// ============================================================================

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session
    async fn insert(&self, session: &Session) -> RepoResult<()>;

    /// Find session by ID
    async fn find_by_id(&self, id: SessionId) -> RepoResult<Option<Session>>;

    /// List every session (live and revoked) for a user
    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Session>>;

    /// Update only the last-activity timestamp of one session
    async fn touch(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()>;

    /// Mark one session revoked
    async fn revoke(&self, id: SessionId, at: DateTime<Utc>) -> RepoResult<()>;

    /// Mark every live session of a user revoked, except `keep` when given.
    /// Returns how many sessions were revoked.
    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
        at: DateTime<Utc>,
    ) -> RepoResult<u64>;

    /// Revoke live sessions whose last activity predates `cutoff`.
    /// Returns how many sessions were revoked.
    async fn revoke_idle_since(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Token Family Store
// ============================================================================

/// Result of a compare-and-swap on a family's current jti
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The expected jti matched and was swapped for the next one
    Rotated,
    /// The family's current jti was not the expected one (reuse signal).
    /// Carries what the store held at comparison time.
    Mismatch { actual: Uuid },
    /// The family has been revoked
    FamilyRevoked,
}

#[async_trait]
pub trait TokenFamilyStore: Send + Sync {
    /// Insert a new family
    async fn insert(&self, family: &TokenFamily) -> RepoResult<()>;

    /// Find family by ID
    async fn find_by_id(&self, id: FamilyId) -> RepoResult<Option<TokenFamily>>;

    /// Atomically swap the family's current jti from `expected` to `next`.
    ///
    /// Under concurrent calls with the same `expected`, exactly one caller
    /// observes [`RotationOutcome::Rotated`].
    async fn rotate_jti(
        &self,
        id: FamilyId,
        expected: Uuid,
        next: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<RotationOutcome>;

    /// Mark one family revoked
    async fn revoke(&self, id: FamilyId) -> RepoResult<()>;

    /// Mark every family of a user revoked. Returns how many were revoked.
    async fn revoke_all_for_user(&self, user_id: UserId) -> RepoResult<u64>;

    /// Mark every family bound to a session revoked
    async fn revoke_for_session(&self, session_id: SessionId) -> RepoResult<u64>;
}

// ============================================================================
// Revocation Store
// ============================================================================

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Add `jti` to the revocation set for `ttl` (the token's remaining life)
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> RepoResult<()>;

    /// Whether `jti` is in the revocation set
    async fn is_revoked(&self, jti: Uuid) -> RepoResult<bool>;
}

// ============================================================================
// Rate Limit Store
// ============================================================================

/// Post-increment state of one fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Requests recorded in the window, including this one
    pub count: u64,
    /// When the window expires and the count resets
    pub reset_at: DateTime<Utc>,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically increment the counter for `key` in its current fixed
    /// window, creating the window with `window` TTL on first increment.
    ///
    /// The increment happens before any comparison, so concurrent callers
    /// can never both observe a count below the limit once it is reached.
    async fn increment(&self, key: &str, window: Duration) -> RepoResult<WindowCount>;
}

// ============================================================================
// OTP Store
// ============================================================================

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Find the stored code for a phone and purpose
    async fn find(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<Option<OtpRecord>>;

    /// Store a code record, replacing any previous one for the same key
    async fn put(&self, record: &OtpRecord) -> RepoResult<()>;

    /// Delete the code for a phone and purpose
    async fn delete(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<()>;

    /// Atomically bump the wrong-attempt counter, returning the new value
    async fn increment_attempts(&self, phone: &str, purpose: OtpPurpose) -> RepoResult<u32>;

    /// Count a generation for the rolling window, returning the new total
    async fn record_generation(&self, phone: &str, window: Duration) -> RepoResult<u64>;

    /// Block the phone until `until`
    async fn block(&self, phone: &str, until: DateTime<Utc>) -> RepoResult<()>;

    /// When the phone's block lifts, if it is blocked
    async fn blocked_until(&self, phone: &str) -> RepoResult<Option<DateTime<Utc>>>;

    /// Drop expired code records. Backends with native TTLs return 0.
    async fn clear_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Audit Log Store
// ============================================================================

/// Filters for audit queries. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    /// Substring match on the action name
    pub action_contains: Option<String>,
    pub min_severity: Option<Severity>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Append one entry. The log is append-only.
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()>;

    /// Query entries, newest first
    async fn query(&self, query: &AuditQuery) -> RepoResult<Vec<AuditLogEntry>>;

    /// Delete entries older than `cutoff`. Returns how many were removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;
}
