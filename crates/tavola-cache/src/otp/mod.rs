//! One-time code storage module.

mod codes;

pub use codes::RedisOtpStore;
