//! Test helpers for integration tests
//!
//! Spawns real servers on the in-process storage backend and wraps the
//! HTTP verbs the tests use. No external services are required.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tavola_api::middleware::guard::CONFIRMATION_HEADER;
use tavola_api::state::{AppState, BackendHandles};
use tavola_api::{create_app, create_app_state};
use tavola_common::config::{
    AppConfig, AppSettings, AuditConfig, CorsConfig, Environment, JwtConfig, OtpConfig,
    RateLimitConfig, RateQuota, ServerConfig, SessionConfig, StorageBackend, StorageConfig,
};
use tavola_common::{hash_password, JwtService};
use tavola_core::entities::User;
use tavola_core::value_objects::{Role, TenantId};
use tavola_memstore::{
    MemoryAuditLogStore, MemoryOtpStore, MemoryRateLimitStore, MemoryRevocationStore,
    MemorySessionStore, MemoryTokenFamilyStore, MemoryUserRepository,
};
use tavola_service::{OtpSender, ServiceContext, ServiceContextBuilder};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures::unique_phone;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    /// Direct handle into the running server's stores, for seeding
    pub context: Arc<ServiceContext>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with the default test configuration
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_app_state(config).await?;
        let context = state.context_handle();
        Self::spawn(state, context).await
    }

    /// Start a test server whose OTP sender records codes instead of
    /// delivering them
    pub async fn start_with_otp_capture() -> Result<(Self, Arc<CapturingOtpSender>)> {
        let config = test_config();
        let sender = Arc::new(CapturingOtpSender::default());

        let context = memory_context_builder(&config)
            .otp_sender(sender.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("service context: {e}"))?;
        let state = AppState::new(context, config, BackendHandles::default());
        let handle = state.context_handle();

        let server = Self::spawn(state, handle).await?;
        Ok((server, sender))
    }

    async fn spawn(state: AppState, context: Arc<ServiceContext>) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            context,
            _handle: handle,
        })
    }

    /// Insert a user with the given role directly into the running
    /// server's store. Registration over HTTP only creates customers.
    pub async fn seed_user(&self, tenant_id: TenantId, role: Role, password: &str) -> Result<User> {
        let user = User::new(
            tenant_id,
            unique_phone(),
            "Seeded User".to_string(),
            role,
        );
        let hash = hash_password(password)?;
        self.context.users().create(&user, &hash).await?;
        Ok(user)
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a GET request with auth token
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request with auth token
    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with auth token
    pub async fn put_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with auth token and the destructive
    /// confirmation header
    pub async fn put_auth_confirmed<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header(CONFIRMATION_HEADER, "confirmed")
            .json(body)
            .send()
            .await?)
    }

    /// Make a DELETE request with auth token
    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?)
    }

    /// Make a DELETE request with auth token and the destructive
    /// confirmation header
    pub async fn delete_auth_confirmed(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header(CONFIRMATION_HEADER, "confirmed")
            .send()
            .await?)
    }
}

/// Build the test configuration: in-process backend, default quotas,
/// no environment variables involved.
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "tavola-auth-test".to_string(),
            env: Environment::Development,
        },
        api: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 10,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        database: None,
        redis: None,
        jwt: JwtConfig {
            secret: "integration-test-secret-key-long-enough".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604_800,
            issuer: "tavola-auth".to_string(),
        },
        rate_limit: RateLimitConfig {
            login: quota(5, 300),
            otp_request: quota(3, 60),
            otp_verify: quota(5, 60),
            refresh: quota(10, 60),
            authenticated: quota(100, 60),
        },
        otp: OtpConfig {
            code_ttl_seconds: 600,
            max_verify_attempts: 3,
            max_per_hour: 5,
            block_hours: 24,
        },
        session: SessionConfig {
            idle_revoke_days: 30,
            sweep_interval_seconds: 3600,
        },
        audit: AuditConfig {
            retention_days: 365,
            max_page_size: 100,
        },
        cors: CorsConfig {
            allowed_origins: Vec::new(),
        },
    }
}

fn quota(max_requests: u32, window_seconds: u64) -> RateQuota {
    RateQuota {
        max_requests,
        window_seconds,
    }
}

/// In-process store wiring matching what the server builds for the
/// memory backend, left open for an injected OTP sender.
fn memory_context_builder(config: &AppConfig) -> ServiceContextBuilder {
    ServiceContextBuilder::new()
        .users(Arc::new(MemoryUserRepository::new()))
        .sessions(Arc::new(MemorySessionStore::new()))
        .families(Arc::new(MemoryTokenFamilyStore::new()))
        .revocations(Arc::new(MemoryRevocationStore::new()))
        .rate_limits(Arc::new(MemoryRateLimitStore::new()))
        .otp_codes(Arc::new(MemoryOtpStore::new()))
        .audit_log(Arc::new(MemoryAuditLogStore::new()))
        .jwt(Arc::new(JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
            &config.jwt.issuer,
        )))
        .rate_quotas(config.rate_limit.clone())
        .otp_config(config.otp.clone())
        .session_config(config.session.clone())
        .audit_config(config.audit.clone())
}

/// OTP sender that records what it would have delivered
#[derive(Default)]
pub struct CapturingOtpSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingOtpSender {
    /// The most recently issued code for `phone`, if any
    pub fn last_code_for(&self, phone: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("sender lock")
            .iter()
            .rev()
            .find(|(to, _)| to == phone)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl OtpSender for CapturingOtpSender {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .expect("sender lock")
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
