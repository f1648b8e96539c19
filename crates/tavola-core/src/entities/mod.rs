//! Domain entities - core business objects

mod audit;
mod otp;
mod session;
mod token_family;
mod user;

pub use audit::{AuditLogEntry, Severity};
pub use otp::{OtpPurpose, OtpRecord};
pub use session::Session;
pub use token_family::TokenFamily;
pub use user::User;
