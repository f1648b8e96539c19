//! # tavola-common
//!
//! Shared utilities including configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    digest_signals, fingerprint_from_request, hash_password, normalize_fingerprint,
    validate_password_strength, verify_password, Claims, JwtService, TokenIdentity, TokenPair,
    TokenType,
};
pub use config::{
    AppConfig, AppSettings, AuditConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    JwtConfig, OtpConfig, RateLimitConfig, RateQuota, RedisConfig, ServerConfig, SessionConfig,
    StorageBackend,
};
pub use error::{AppError, AppResult};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
