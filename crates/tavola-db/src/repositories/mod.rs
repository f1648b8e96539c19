//! Repository implementations
//!
//! PostgreSQL implementations of the store traits defined in tavola-core.

mod audit_log;
mod error;
mod session;
mod token_family;
mod user;

pub use audit_log::PgAuditLogStore;
pub use session::PgSessionStore;
pub use token_family::PgTokenFamilyStore;
pub use user::PgUserRepository;
