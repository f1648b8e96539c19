//! Ports - traits the infrastructure layer implements

mod stores;

pub use stores::{
    AuditLogStore, AuditQuery, OtpStore, RateLimitStore, RepoResult, RevocationStore,
    RotationOutcome, SessionStore, TokenFamilyStore, UserRepository, WindowCount,
};
