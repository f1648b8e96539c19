//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{FamilyId, SessionId, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Token family not found: {0}")]
    FamilyNotFound(FamilyId),

    #[error("No one-time code on file")]
    OtpNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Phone number already registered")]
    PhoneAlreadyExists,

    #[error("Session already exists: {0}")]
    SessionAlreadyExists(SessionId),

    #[error("Token family already exists: {0}")]
    FamilyAlreadyExists(FamilyId),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::SessionNotFound(_) => "UNKNOWN_SESSION",
            Self::FamilyNotFound(_) => "UNKNOWN_TOKEN_FAMILY",
            Self::OtpNotFound => "UNKNOWN_OTP",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidPhone(_) => "INVALID_PHONE",
            Self::InvalidRole(_) => "INVALID_ROLE",
            Self::WeakPassword(_) => "WEAK_PASSWORD",

            // Conflict
            Self::PhoneAlreadyExists => "PHONE_ALREADY_EXISTS",
            Self::SessionAlreadyExists(_) => "SESSION_ALREADY_EXISTS",
            Self::FamilyAlreadyExists(_) => "TOKEN_FAMILY_ALREADY_EXISTS",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::SessionNotFound(_)
                | Self::FamilyNotFound(_)
                | Self::OtpNotFound
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidPhone(_)
                | Self::InvalidRole(_)
                | Self::WeakPassword(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PhoneAlreadyExists
                | Self::SessionAlreadyExists(_)
                | Self::FamilyAlreadyExists(_)
        )
    }

    /// Check if the underlying store failed (callers must fail closed)
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::UserNotFound(UserId::generate());
        assert_eq!(err.code(), "UNKNOWN_USER");

        let err = DomainError::InvalidPhone("abc".to_string());
        assert_eq!(err.code(), "INVALID_PHONE");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::SessionNotFound(SessionId::generate()).is_not_found());
        assert!(DomainError::OtpNotFound.is_not_found());
        assert!(!DomainError::PhoneAlreadyExists.is_not_found());
    }

    #[test]
    fn test_is_infrastructure() {
        assert!(DomainError::CacheError("down".to_string()).is_infrastructure());
        assert!(!DomainError::OtpNotFound.is_infrastructure());
    }

    #[test]
    fn test_error_display() {
        let id = UserId::generate();
        let err = DomainError::UserNotFound(id);
        assert_eq!(err.to_string(), format!("User not found: {id}"));
    }
}
