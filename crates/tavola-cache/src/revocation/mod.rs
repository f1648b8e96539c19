//! Revoked-token set module.
//!
//! Tracks access token ids that were cut off before their natural expiry.

mod revoked_tokens;

pub use revoked_tokens::RedisRevocationStore;
