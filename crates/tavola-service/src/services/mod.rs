//! Business logic services
//!
//! Everything above the storage traits lives here: account lifecycle,
//! token issuance and rotation, one-time codes, access control, rate
//! limiting, and the audit trail. Handlers call these; these call the
//! stores through `ServiceContext`.

pub mod account;
pub mod audit;
pub mod context;
pub mod error;
pub mod otp;
pub mod rate_limit;
pub mod rbac;
pub mod sweeper;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountService;
pub use audit::{AuditService, RequestOrigin};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use otp::{LoggingOtpSender, OtpSender, OtpService};
pub use rate_limit::{RateCheck, RateLimitService};
pub use rbac::{AuthContext, RbacService, ResourceRef};
pub use sweeper::{SweepReport, Sweeper};
pub use token::{IssuedTokens, TokenService};
