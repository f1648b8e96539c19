//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use tavola_core::error::DomainError;
use tavola_core::value_objects::{FamilyId, SessionId, UserId};

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "user not found" error
pub fn user_not_found(id: UserId) -> DomainError {
    DomainError::UserNotFound(id)
}

/// Create a "session not found" error
pub fn session_not_found(id: SessionId) -> DomainError {
    DomainError::SessionNotFound(id)
}

/// Create a "token family not found" error
pub fn family_not_found(id: FamilyId) -> DomainError {
    DomainError::FamilyNotFound(id)
}
