//! # tavola-core
//!
//! Domain layer containing entities, value objects, and store traits.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{AuditLogEntry, OtpPurpose, OtpRecord, Session, Severity, TokenFamily, User};
pub use error::DomainError;
pub use traits::{
    AuditLogStore, AuditQuery, OtpStore, RateLimitStore, RepoResult, RevocationStore,
    RotationOutcome, SessionStore, TokenFamilyStore, UserRepository, WindowCount,
};
pub use value_objects::{
    can_manage_role, normalize_phone, permissions_for, role_has_permission, FamilyId, Permission,
    Role, SessionId, TenantId, UserId,
};
