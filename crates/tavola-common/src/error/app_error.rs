//! Application error types
//!
//! Unified error handling for the entire application.

use std::fmt;

use tavola_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Refresh token reuse detected")]
    ReuseDetected,

    // Authorization errors
    #[error("Role not permitted for this operation")]
    InsufficientRole,

    #[error("Insufficient permission")]
    InsufficientPermission,

    #[error("Resource belongs to another tenant")]
    TenantMismatch,

    #[error("This operation requires explicit confirmation")]
    ConfirmationRequired,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // OTP errors
    #[error("Invalid verification code")]
    OtpInvalid { remaining_attempts: u32 },

    #[error("Verification code expired or not found")]
    OtpExpired,

    #[error("A verification code was already sent")]
    OtpActive { retry_after_secs: u64 },

    #[error("Phone number temporarily blocked")]
    OtpBlocked { retry_after_secs: u64 },

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Rate limiting
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    // Auth backend failures deny the request rather than letting it through
    #[error("Authentication backend unavailable")]
    AuthUnavailable,

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Redis errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::Validation(_)
            | Self::InvalidInput(_)
            | Self::ConfirmationRequired
            | Self::OtpInvalid { .. }
            | Self::OtpExpired => 400,

            // 401 Unauthorized
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::ReuseDetected => 401,

            // 403 Forbidden
            Self::InsufficientRole | Self::InsufficientPermission | Self::TenantMismatch => 403,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict
            Self::AlreadyExists(_) | Self::Conflict(_) => 409,

            // 429 Too Many Requests
            Self::RateLimited { .. } | Self::OtpActive { .. } | Self::OtpBlocked { .. } => 429,

            // 503 Service Unavailable
            Self::AuthUnavailable => 503,

            // 500 Internal Server Error
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) | Self::Config(_) => 500,

            // Map domain errors to appropriate status codes
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_validation() {
                    400
                } else if e.is_conflict() {
                    409
                } else {
                    500
                }
            }
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::ReuseDetected => "REUSE_DETECTED",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::InsufficientPermission => "INSUFFICIENT_PERMISSION",
            Self::TenantMismatch => "TENANT_MISMATCH",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::OtpInvalid { .. } => "OTP_INVALID",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpActive { .. } => "OTP_ACTIVE",
            Self::OtpBlocked { .. } => "OTP_BLOCKED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::AuthUnavailable => "AUTH_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Seconds the client should wait before retrying, for throttled errors
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs }
            | Self::OtpActive { retry_after_secs }
            | Self::OtpBlocked { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        let status = self.status_code();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        let status = self.status_code();
        (500..600).contains(&status)
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
