//! Database models - SQLx-compatible structs for PostgreSQL tables

mod audit_log;
mod session;
mod token_family;
mod user;

pub use audit_log::AuditLogModel;
pub use session::SessionModel;
pub use token_family::TokenFamilyModel;
pub use user::UserModel;
