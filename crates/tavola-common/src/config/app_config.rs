//! Application configuration structs
//!
//! Loads configuration from environment variables, with typed sections and
//! explicit defaults for everything that is tunable.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub storage: StorageConfig,
    /// Required when the storage backend is `external`
    pub database: Option<DatabaseConfig>,
    /// Required when the storage backend is `external`
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub otp: OtpConfig,
    pub session: SessionConfig,
    pub audit: AuditConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds before an in-flight request is abandoned
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which store implementations back the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// In-process stores. Valid for a single instance only; state is lost
    /// on restart and not shared across replicas.
    Memory,
    /// PostgreSQL and Redis
    #[default]
    External,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "external" => Ok(Self::External),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,
    pub issuer: String,
}

/// One fixed-window quota: at most `max_requests` per `window_seconds`
#[derive(Debug, Clone, Copy)]
pub struct RateQuota {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Per-use-case rate limit quotas
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Login attempts, keyed by phone and source ip
    pub login: RateQuota,
    /// OTP code requests, keyed by phone
    pub otp_request: RateQuota,
    /// OTP verification attempts, keyed by phone
    pub otp_verify: RateQuota,
    /// Refresh rotations, keyed by token family
    pub refresh: RateQuota,
    /// Authenticated traffic, keyed by user
    pub authenticated: RateQuota,
}

/// One-time code configuration
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Seconds a generated code stays valid
    pub code_ttl_seconds: u64,
    /// Wrong attempts before the phone is blocked
    pub max_verify_attempts: u32,
    /// Generations per rolling hour before the phone is blocked
    pub max_per_hour: u32,
    /// How long a block lasts, in hours
    pub block_hours: u64,
}

/// Session lifecycle configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Days of inactivity after which a session is revoked
    pub idle_revoke_days: u32,
    /// Seconds between sweeper passes
    pub sweep_interval_seconds: u64,
}

/// Audit log configuration
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Days an entry is retained before the sweeper purges it
    pub retention_days: u32,
    /// Hard cap on one page of query results
    pub max_page_size: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "tavola-auth".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or
    /// hold values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage = StorageConfig {
            backend: parse_var("STORAGE_BACKEND", StorageBackend::default())?,
        };

        let database = match env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 20)?,
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", 5)?,
            }),
            Err(_) => None,
        };

        let redis = match env::var("REDIS_URL") {
            Ok(url) => Some(RedisConfig {
                url,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS", 10)?,
            }),
            Err(_) => None,
        };

        if storage.backend == StorageBackend::External {
            if database.is_none() {
                return Err(ConfigError::MissingVar("DATABASE_URL"));
            }
            if redis.is_none() {
                return Err(ConfigError::MissingVar("REDIS_URL"));
            }
        }

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: required_var("API_PORT")?,
                request_timeout_secs: parse_var("API_REQUEST_TIMEOUT_SECS", 30)?,
            },
            storage,
            database,
            redis,
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
                access_token_expiry: parse_var("JWT_ACCESS_TOKEN_EXPIRY", 900)?,
                refresh_token_expiry: parse_var("JWT_REFRESH_TOKEN_EXPIRY", 604_800)?,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| default_app_name()),
            },
            rate_limit: RateLimitConfig {
                login: quota_from_env(
                    "RATE_LIMIT_LOGIN_MAX",
                    "RATE_LIMIT_LOGIN_WINDOW_SECS",
                    5,
                    300,
                )?,
                otp_request: quota_from_env(
                    "RATE_LIMIT_OTP_REQUEST_MAX",
                    "RATE_LIMIT_OTP_REQUEST_WINDOW_SECS",
                    3,
                    60,
                )?,
                otp_verify: quota_from_env(
                    "RATE_LIMIT_OTP_VERIFY_MAX",
                    "RATE_LIMIT_OTP_VERIFY_WINDOW_SECS",
                    5,
                    60,
                )?,
                refresh: quota_from_env(
                    "RATE_LIMIT_REFRESH_MAX",
                    "RATE_LIMIT_REFRESH_WINDOW_SECS",
                    10,
                    60,
                )?,
                authenticated: quota_from_env(
                    "RATE_LIMIT_AUTHENTICATED_MAX",
                    "RATE_LIMIT_AUTHENTICATED_WINDOW_SECS",
                    100,
                    60,
                )?,
            },
            otp: OtpConfig {
                code_ttl_seconds: parse_var("OTP_CODE_TTL_SECS", 600)?,
                max_verify_attempts: parse_var("OTP_MAX_ATTEMPTS", 3)?,
                max_per_hour: parse_var("OTP_MAX_PER_HOUR", 5)?,
                block_hours: parse_var("OTP_BLOCK_HOURS", 24)?,
            },
            session: SessionConfig {
                idle_revoke_days: parse_var("SESSION_IDLE_REVOKE_DAYS", 30)?,
                sweep_interval_seconds: parse_var("SWEEP_INTERVAL_SECS", 3600)?,
            },
            audit: AuditConfig {
                retention_days: parse_var("AUDIT_RETENTION_DAYS", 365)?,
                max_page_size: parse_var("AUDIT_MAX_PAGE_SIZE", 100)?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .ok()
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_default(),
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
/// Set-but-malformed values are a hard error rather than a silent default.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Parse a required variable
fn required_var<T: FromStr>(name: &'static str) -> Result<T, ConfigError> {
    let raw = env::var(name).map_err(|_| ConfigError::MissingVar(name))?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue(name, raw))
}

/// Build a quota from a pair of `_MAX` / `_WINDOW_SECS` variables
fn quota_from_env(
    max_name: &'static str,
    window_name: &'static str,
    default_max: u32,
    default_window: u64,
) -> Result<RateQuota, ConfigError> {
    Ok(RateQuota {
        max_requests: parse_var(max_name, default_max)?,
        window_seconds: parse_var(window_name, default_window)?,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_storage_backend_parses() {
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert_eq!(
            "External".parse::<StorageBackend>().unwrap(),
            StorageBackend::External
        );
        assert!("filesystem".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_var_prefers_default_when_unset() {
        let value: u32 = parse_var("TAVOLA_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
