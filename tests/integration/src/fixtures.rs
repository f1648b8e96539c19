//! Test fixtures and data generators
//!
//! Request builders and response mirrors for driving the API over HTTP.
//! The mirrors stay independent of the server-side DTOs so a wire format
//! change breaks a test instead of silently following along.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A distinct phone number, already in normalized form
pub fn unique_phone() -> String {
    format!("+1415{:09}", unique_suffix())
}

// ============================================================================
// Requests
// ============================================================================

/// Registration request
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub tenant_id: Uuid,
    pub phone: String,
    pub password: String,
    pub display_name: String,
}

impl RegisterRequest {
    pub fn unique(tenant_id: Uuid) -> Self {
        let suffix = unique_suffix();
        Self {
            tenant_id,
            phone: format!("+1415{suffix:09}"),
            password: "correct-horse-9".to_string(),
            display_name: format!("Test User {suffix}"),
        }
    }
}

/// Password login request
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub tenant_id: Uuid,
    pub phone: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_register(reg: &RegisterRequest) -> Self {
        Self {
            tenant_id: reg.tenant_id,
            phone: reg.phone.clone(),
            password: reg.password.clone(),
        }
    }

    pub fn wrong_password(reg: &RegisterRequest) -> Self {
        Self {
            tenant_id: reg.tenant_id,
            phone: reg.phone.clone(),
            password: "not-the-password-1".to_string(),
        }
    }
}

/// Token refresh request
#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// One-time code request
#[derive(Debug, Serialize)]
pub struct OtpRequest {
    pub phone: String,
    pub purpose: String,
}

/// One-time code verification request
#[derive(Debug, Serialize)]
pub struct OtpVerifyRequest {
    pub tenant_id: Uuid,
    pub phone: String,
    pub purpose: String,
    pub code: String,
}

/// Role change request
#[derive(Debug, Serialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// Order placement request
#[derive(Debug, Serialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItem>,
}

/// One order line
#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

impl PlaceOrderRequest {
    pub fn simple() -> Self {
        Self {
            items: vec![OrderItem {
                name: "Margherita".to_string(),
                quantity: 2,
            }],
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Authentication response
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub user: UserResponse,
}

/// Account payload in auth responses
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub display_name: String,
    pub role: String,
    pub created_at: String,
}

/// Token pair from refresh
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Session list entry
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub fingerprint: Option<String>,
    pub created_at: String,
    pub last_activity_at: String,
    pub current: bool,
}

/// Count of sessions revoked by a bulk operation
#[derive(Debug, Deserialize)]
pub struct RevokedSessionsResponse {
    pub revoked: u64,
}

/// Acknowledgement that a one-time code was issued
#[derive(Debug, Deserialize)]
pub struct OtpRequestedResponse {
    pub phone: String,
    pub expires_in: u64,
}

/// Acknowledgement that a non-login code verified
#[derive(Debug, Deserialize)]
pub struct OtpVerifiedResponse {
    pub verified: bool,
}

/// Result of a role change
#[derive(Debug, Deserialize)]
pub struct RoleChangedResponse {
    pub user_id: Uuid,
    pub role: String,
    pub revoked_sessions: u64,
}

/// One audit log entry
#[derive(Debug, Deserialize)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub severity: String,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

/// Count of purged audit entries
#[derive(Debug, Deserialize)]
pub struct PurgedResponse {
    pub purged: u64,
}

/// Order placement acknowledgement
#[derive(Debug, Deserialize)]
pub struct OrderPlacedResponse {
    pub order_id: Uuid,
    pub status: String,
    pub placed_by: Uuid,
}

/// Liveness probe payload
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness probe payload
#[derive(Debug, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
    pub cache: bool,
}

/// Error envelope
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Error detail inside the envelope
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(rename = "retryAfter")]
    pub retry_after: Option<u64>,
    #[serde(rename = "requiresConfirmation")]
    pub requires_confirmation: Option<bool>,
    #[serde(rename = "remainingAttempts")]
    pub remaining_attempts: Option<u32>,
}
