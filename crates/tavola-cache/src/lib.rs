//! # tavola-cache
//!
//! Redis-backed stores for the hot auth paths: the revoked-token set,
//! fixed-window rate counters, and one-time codes.
//!
//! Every store leans on native key expiry, so nothing here needs a
//! background sweeper. All server instances sharing one Redis see the
//! same counters and revocations, which is what makes this backend safe
//! for multi-instance deployments.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tavola_cache::{RedisPool, RedisPoolConfig, RedisRevocationStore};
//!
//! let config = RedisPoolConfig { url: "redis://127.0.0.1:6379".into(), max_connections: 16 };
//! let pool = Arc::new(RedisPool::new(config)?);
//! let revocations = RedisRevocationStore::new(pool.clone());
//!
//! revocations.revoke(jti, remaining_lifetime).await?;
//! assert!(revocations.is_revoked(jti).await?);
//! ```

mod error;

pub mod otp;
pub mod pool;
pub mod rate_limit;
pub mod revocation;

// Re-export pool types
pub use pool::{
    create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};

// Re-export store types
pub use otp::RedisOtpStore;
pub use rate_limit::RedisRateLimitStore;
pub use revocation::RedisRevocationStore;
