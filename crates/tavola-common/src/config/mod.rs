//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, AuditConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    JwtConfig, OtpConfig, RateLimitConfig, RateQuota, RedisConfig, ServerConfig, SessionConfig,
    StorageBackend, StorageConfig,
};
