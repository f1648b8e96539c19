//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tavola_common::TokenPair;
use tavola_core::entities::{AuditLogEntry, Session, Severity, User};
use tavola_core::value_objects::{Role, SessionId};
use uuid::Uuid;

// ============================================================================
// Auth Responses
// ============================================================================

/// Authentication response with tokens
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(tokens: TokenPair, user: &User) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            refresh_expires_in: tokens.refresh_expires_in,
            user: UserResponse::from(user),
        }
    }
}

/// Fresh token pair without the user payload, returned by refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            refresh_expires_in: tokens.refresh_expires_in,
        }
    }
}

// ============================================================================
// User Responses
// ============================================================================

/// Account payload included in auth responses
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_uuid(),
            tenant_id: user.tenant_id.as_uuid(),
            phone: user.phone.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Session Responses
// ============================================================================

/// One session in the caller's session list
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// True for the session the request was authenticated with
    pub current: bool,
}

impl SessionResponse {
    pub fn from_session(session: &Session, current_session_id: SessionId) -> Self {
        Self {
            id: session.id.as_uuid(),
            fingerprint: session.fingerprint.clone(),
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
            current: session.id == current_session_id,
        }
    }
}

/// Count of sessions revoked by a bulk operation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RevokedSessionsResponse {
    pub revoked: u64,
}

// ============================================================================
// OTP Responses
// ============================================================================

/// Acknowledgement that a one-time code was issued
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequestedResponse {
    /// Normalized phone the code was sent to
    pub phone: String,
    /// Seconds until the code expires
    pub expires_in: u64,
}

/// Acknowledgement that a non-login code verified successfully
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OtpVerifiedResponse {
    pub verified: bool,
}

// ============================================================================
// Member Responses
// ============================================================================

/// Result of a role change
#[derive(Debug, Clone, Serialize)]
pub struct RoleChangedResponse {
    pub user_id: Uuid,
    pub role: Role,
    /// Sessions revoked as part of the change
    pub revoked_sessions: u64,
}

// ============================================================================
// Audit Responses
// ============================================================================

/// One audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub severity: Severity,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditLogResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            tenant_id: entry.tenant_id.map(|id| id.as_uuid()),
            user_id: entry.user_id.map(|id| id.as_uuid()),
            action: entry.action,
            severity: entry.severity,
            details: entry.details,
            ip: entry.ip,
            user_agent: entry.user_agent,
            created_at: entry.created_at,
        }
    }
}

/// Count of audit entries purged past retention
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurgedResponse {
    pub purged: u64,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Liveness probe payload
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Readiness probe payload with per-dependency health
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
    pub cache: bool,
}

impl ReadinessResponse {
    #[must_use]
    pub fn ready(database: bool, cache: bool) -> Self {
        Self {
            ready: database && cache,
            database,
            cache,
        }
    }
}
