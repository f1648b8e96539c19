//! Phone number normalization
//!
//! Every phone-keyed lookup (accounts, OTP records, rate-limit keys) goes
//! through [`normalize_phone`] first so that formatting variants of the
//! same number always hit the same record.

use crate::error::DomainError;

/// Separator characters tolerated in user-supplied numbers
const SEPARATORS: [char; 5] = [' ', '-', '(', ')', '.'];

/// Normalize a phone number to digits with an optional leading `+`.
///
/// Separators are stripped; a `+` is kept only in the leading position.
/// Anything else, or a digit count outside 8..=15, is rejected.
///
/// # Errors
///
/// Returns [`DomainError::InvalidPhone`] for malformed input.
pub fn normalize_phone(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let mut normalized = String::with_capacity(trimmed.len());

    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == '+' && i == 0 {
            normalized.push(c);
        } else if SEPARATORS.contains(&c) {
            continue;
        } else {
            return Err(DomainError::InvalidPhone(raw.to_string()));
        }
    }

    let digits = normalized.chars().filter(char::is_ascii_digit).count();
    if !(8..=15).contains(&digits) {
        return Err(DomainError::InvalidPhone(raw.to_string()));
    }

    Ok(normalized)
}
