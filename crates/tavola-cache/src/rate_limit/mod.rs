//! Fixed-window rate-limit counters.

mod fixed_window;

pub use fixed_window::RedisRateLimitStore;
