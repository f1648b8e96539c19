//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; bodies with user-supplied
//! fields also implement `Validate` for input validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tavola_core::entities::{OtpPurpose, Severity};
use tavola_core::value_objects::Role;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// Account registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    pub tenant_id: Uuid,

    #[validate(length(min = 8, max = 20, message = "Phone must be 8-20 characters"))]
    pub phone: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 64, message = "Display name must be 1-64 characters"))]
    pub display_name: String,
}

/// Password login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    pub tenant_id: Uuid,

    #[validate(length(min = 8, max = 20, message = "Phone must be 8-20 characters"))]
    pub phone: String,

    pub password: String,
}

/// Token refresh request
///
/// The refresh token may also arrive in the `X-Refresh-Token` header, in
/// which case the body can be empty.
#[derive(Debug, Clone, Deserialize, Default, Validate)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

// ============================================================================
// OTP Requests
// ============================================================================

/// Request a one-time code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(length(min = 8, max = 20, message = "Phone must be 8-20 characters"))]
    pub phone: String,

    pub purpose: OtpPurpose,
}

/// Verify a one-time code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OtpVerifyRequest {
    pub tenant_id: Uuid,

    #[validate(length(min = 8, max = 20, message = "Phone must be 8-20 characters"))]
    pub phone: String,

    pub purpose: OtpPurpose,

    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

// ============================================================================
// Member Requests
// ============================================================================

/// Change a member's role within a tenant
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

// ============================================================================
// Audit Requests
// ============================================================================

/// Audit log query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub user_id: Option<Uuid>,
    /// Substring match on the action name
    pub action: Option<String>,
    pub min_severity: Option<Severity>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Security event query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityEventsQuery {
    /// Hours to look back, defaults to 24
    pub hours: Option<u32>,
}
