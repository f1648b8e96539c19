//! Password hashing and verification utilities
//!
//! Uses Argon2id for secure password hashing (OWASP recommended).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tavola_core::DomainError;

use crate::error::AppError;

/// Longest password accepted for hashing.
const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a stored PHC hash string
///
/// # Errors
/// Returns an error if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Validate password strength
///
/// Requirements: 8 to 128 characters, at least one letter, at least one digit.
///
/// # Errors
/// Returns `DomainError::WeakPassword` when a requirement is not met
pub fn validate_password_strength(password: &str) -> Result<(), DomainError> {
    if password.len() < 8 {
        return Err(DomainError::WeakPassword(
            "must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(DomainError::WeakPassword(format!(
            "must be at most {MAX_PASSWORD_LEN} characters long"
        )));
    }

    if !password.chars().any(char::is_alphabetic) {
        return Err(DomainError::WeakPassword(
            "must contain at least one letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::WeakPassword(
            "must contain at least one digit".to_string(),
        ));
    }

    Ok(())
}
