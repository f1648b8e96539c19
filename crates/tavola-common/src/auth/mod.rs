//! Authentication utilities

mod fingerprint;
mod jwt;
mod password;

pub use fingerprint::{digest_signals, fingerprint_from_request, normalize_fingerprint};
pub use jwt::{Claims, JwtService, TokenIdentity, TokenPair, TokenType};
pub use password::{hash_password, validate_password_strength, verify_password};
