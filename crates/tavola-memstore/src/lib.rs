//! # tavola-memstore
//!
//! In-process storage backend. Implements every store trait from
//! `tavola-core` on concurrent maps, so the full service stack runs with no
//! external infrastructure. Used for development, demos, and the
//! integration test suite.
//!
//! All atomicity guarantees (jti compare-and-swap, counter increments) hold
//! within one process. Counters and revocation state are not shared across
//! instances; deployments running more than one replica use the external
//! backend instead.

pub mod audit;
pub mod families;
pub mod otp;
pub mod rate_limit;
pub mod revocations;
pub mod sessions;
pub mod users;

mod window;

pub use audit::MemoryAuditLogStore;
pub use families::MemoryTokenFamilyStore;
pub use otp::MemoryOtpStore;
pub use rate_limit::MemoryRateLimitStore;
pub use revocations::MemoryRevocationStore;
pub use sessions::MemorySessionStore;
pub use users::MemoryUserRepository;
