//! Shared fixtures for service unit tests.
//!
//! Everything runs on the in-process stores, so tests need no external
//! infrastructure.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tavola_common::auth::JwtService;
use tavola_common::config::{AuditConfig, OtpConfig, RateLimitConfig, RateQuota, SessionConfig};
use tavola_core::entities::{Session, User};
use tavola_core::value_objects::{Role, TenantId};
use tavola_memstore::{
    MemoryAuditLogStore, MemoryOtpStore, MemoryRateLimitStore, MemoryRevocationStore,
    MemorySessionStore, MemoryTokenFamilyStore, MemoryUserRepository,
};
use uuid::Uuid;

use super::context::{ServiceContext, ServiceContextBuilder};
use super::otp::OtpSender;

pub(crate) fn unique_phone() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("+1415{n:09}")
}

fn quota(max_requests: u32, window_seconds: u64) -> RateQuota {
    RateQuota {
        max_requests,
        window_seconds,
    }
}

fn builder() -> ServiceContextBuilder {
    ServiceContextBuilder::new()
        .users(Arc::new(MemoryUserRepository::new()))
        .sessions(Arc::new(MemorySessionStore::new()))
        .families(Arc::new(MemoryTokenFamilyStore::new()))
        .revocations(Arc::new(MemoryRevocationStore::new()))
        .rate_limits(Arc::new(MemoryRateLimitStore::new()))
        .otp_codes(Arc::new(MemoryOtpStore::new()))
        .audit_log(Arc::new(MemoryAuditLogStore::new()))
        .jwt(Arc::new(JwtService::new(
            "unit-test-secret-key-long-enough",
            900,
            604_800,
            "tavola-auth",
        )))
        .rate_quotas(RateLimitConfig {
            login: quota(5, 300),
            otp_request: quota(3, 60),
            otp_verify: quota(5, 60),
            refresh: quota(10, 60),
            authenticated: quota(100, 60),
        })
        .otp_config(OtpConfig {
            code_ttl_seconds: 600,
            max_verify_attempts: 3,
            max_per_hour: 5,
            block_hours: 24,
        })
        .session_config(SessionConfig {
            idle_revoke_days: 30,
            sweep_interval_seconds: 3600,
        })
        .audit_config(AuditConfig {
            retention_days: 365,
            max_page_size: 100,
        })
}

pub(crate) fn test_context() -> ServiceContext {
    builder().build().expect("test context")
}

pub(crate) fn test_context_with_sender(sender: Arc<dyn OtpSender>) -> ServiceContext {
    builder().otp_sender(sender).build().expect("test context")
}

/// Sender that records what it would have delivered
pub(crate) struct CapturingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSender {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn last_code(&self) -> Option<String> {
        self.sent
            .lock()
            .expect("sender lock")
            .last()
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .expect("sender lock")
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

/// Insert a user with a placeholder credential into a fresh tenant
pub(crate) async fn seeded_user(ctx: &ServiceContext, role: Role) -> User {
    seeded_user_in(ctx, TenantId::generate(), role).await
}

/// Insert a user with a placeholder credential into `tenant`
pub(crate) async fn seeded_user_in(ctx: &ServiceContext, tenant: TenantId, role: Role) -> User {
    let user = User::new(tenant, unique_phone(), "Test User".to_string(), role);
    ctx.users()
        .create(&user, "placeholder-hash")
        .await
        .expect("create user");
    user
}

/// Open a live session for `user`
pub(crate) async fn open_session(ctx: &ServiceContext, user: &User) -> Session {
    let session = Session::new(user.id, user.tenant_id, None);
    ctx.sessions().insert(&session).await.expect("insert session");
    session
}
