//! Service context - dependency container for services
//!
//! Holds the store implementations, the JWT service, the OTP sender, and
//! the policy configuration sections shared by all services.

use std::sync::Arc;

use tavola_common::auth::JwtService;
use tavola_common::config::{AuditConfig, OtpConfig, RateLimitConfig, SessionConfig};
use tavola_core::traits::{
    AuditLogStore, OtpStore, RateLimitStore, RevocationStore, SessionStore, TokenFamilyStore,
    UserRepository,
};

use super::otp::{LoggingOtpSender, OtpSender};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Persistent stores (users, sessions, token families, audit log)
/// - Volatile stores (revocations, rate limit counters, one-time codes)
/// - JWT service for token signing and verification
/// - The OTP delivery channel
/// - Policy configuration (quotas, code lifetimes, retention)
///
/// Stores are trait objects, so the same context wires up against the
/// in-process backend or the Postgres/Redis backend unchanged.
#[derive(Clone)]
pub struct ServiceContext {
    // Stores
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    families: Arc<dyn TokenFamilyStore>,
    revocations: Arc<dyn RevocationStore>,
    rate_limits: Arc<dyn RateLimitStore>,
    otp_codes: Arc<dyn OtpStore>,
    audit_log: Arc<dyn AuditLogStore>,

    // Services
    jwt: Arc<JwtService>,
    otp_sender: Arc<dyn OtpSender>,

    // Policy
    rate_quotas: RateLimitConfig,
    otp_config: OtpConfig,
    session_config: SessionConfig,
    audit_config: AuditConfig,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        families: Arc<dyn TokenFamilyStore>,
        revocations: Arc<dyn RevocationStore>,
        rate_limits: Arc<dyn RateLimitStore>,
        otp_codes: Arc<dyn OtpStore>,
        audit_log: Arc<dyn AuditLogStore>,
        jwt: Arc<JwtService>,
        otp_sender: Arc<dyn OtpSender>,
        rate_quotas: RateLimitConfig,
        otp_config: OtpConfig,
        session_config: SessionConfig,
        audit_config: AuditConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            families,
            revocations,
            rate_limits,
            otp_codes,
            audit_log,
            jwt,
            otp_sender,
            rate_quotas,
            otp_config,
            session_config,
            audit_config,
        }
    }

    // === Stores ===

    /// Get the user repository
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Get the session store
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// Get the token family store
    pub fn families(&self) -> &dyn TokenFamilyStore {
        self.families.as_ref()
    }

    /// Get the revocation set
    pub fn revocations(&self) -> &dyn RevocationStore {
        self.revocations.as_ref()
    }

    /// Get the rate limit counter store
    pub fn rate_limits(&self) -> &dyn RateLimitStore {
        self.rate_limits.as_ref()
    }

    /// Get the one-time code store
    pub fn otp_codes(&self) -> &dyn OtpStore {
        self.otp_codes.as_ref()
    }

    /// Get the audit log store
    pub fn audit_log(&self) -> &dyn AuditLogStore {
        self.audit_log.as_ref()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt(&self) -> &JwtService {
        self.jwt.as_ref()
    }

    /// Get the OTP delivery channel
    pub fn otp_sender(&self) -> &dyn OtpSender {
        self.otp_sender.as_ref()
    }

    // === Policy ===

    /// Get the rate limit quotas
    pub fn rate_quotas(&self) -> &RateLimitConfig {
        &self.rate_quotas
    }

    /// Get the one-time code policy
    pub fn otp_config(&self) -> &OtpConfig {
        &self.otp_config
    }

    /// Get the session lifecycle policy
    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    /// Get the audit retention policy
    pub fn audit_config(&self) -> &AuditConfig {
        &self.audit_config
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("stores", &"...")
            .field("rate_quotas", &self.rate_quotas)
            .field("otp_config", &self.otp_config)
            .field("session_config", &self.session_config)
            .field("audit_config", &self.audit_config)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    users: Option<Arc<dyn UserRepository>>,
    sessions: Option<Arc<dyn SessionStore>>,
    families: Option<Arc<dyn TokenFamilyStore>>,
    revocations: Option<Arc<dyn RevocationStore>>,
    rate_limits: Option<Arc<dyn RateLimitStore>>,
    otp_codes: Option<Arc<dyn OtpStore>>,
    audit_log: Option<Arc<dyn AuditLogStore>>,
    jwt: Option<Arc<JwtService>>,
    otp_sender: Option<Arc<dyn OtpSender>>,
    rate_quotas: Option<RateLimitConfig>,
    otp_config: Option<OtpConfig>,
    session_config: Option<SessionConfig>,
    audit_config: Option<AuditConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            users: None,
            sessions: None,
            families: None,
            revocations: None,
            rate_limits: None,
            otp_codes: None,
            audit_log: None,
            jwt: None,
            otp_sender: None,
            rate_quotas: None,
            otp_config: None,
            session_config: None,
            audit_config: None,
        }
    }

    pub fn users(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.users = Some(repo);
        self
    }

    pub fn sessions(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn families(mut self, store: Arc<dyn TokenFamilyStore>) -> Self {
        self.families = Some(store);
        self
    }

    pub fn revocations(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.revocations = Some(store);
        self
    }

    pub fn rate_limits(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.rate_limits = Some(store);
        self
    }

    pub fn otp_codes(mut self, store: Arc<dyn OtpStore>) -> Self {
        self.otp_codes = Some(store);
        self
    }

    pub fn audit_log(mut self, store: Arc<dyn AuditLogStore>) -> Self {
        self.audit_log = Some(store);
        self
    }

    pub fn jwt(mut self, service: Arc<JwtService>) -> Self {
        self.jwt = Some(service);
        self
    }

    pub fn otp_sender(mut self, sender: Arc<dyn OtpSender>) -> Self {
        self.otp_sender = Some(sender);
        self
    }

    pub fn rate_quotas(mut self, quotas: RateLimitConfig) -> Self {
        self.rate_quotas = Some(quotas);
        self
    }

    pub fn otp_config(mut self, config: OtpConfig) -> Self {
        self.otp_config = Some(config);
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = Some(config);
        self
    }

    pub fn audit_config(mut self, config: AuditConfig) -> Self {
        self.audit_config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// The OTP sender defaults to the logging sender when none is given.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> super::error::ServiceResult<ServiceContext> {
        use super::error::ServiceError;

        Ok(ServiceContext::new(
            self.users
                .ok_or_else(|| ServiceError::validation("users is required"))?,
            self.sessions
                .ok_or_else(|| ServiceError::validation("sessions is required"))?,
            self.families
                .ok_or_else(|| ServiceError::validation("families is required"))?,
            self.revocations
                .ok_or_else(|| ServiceError::validation("revocations is required"))?,
            self.rate_limits
                .ok_or_else(|| ServiceError::validation("rate_limits is required"))?,
            self.otp_codes
                .ok_or_else(|| ServiceError::validation("otp_codes is required"))?,
            self.audit_log
                .ok_or_else(|| ServiceError::validation("audit_log is required"))?,
            self.jwt
                .ok_or_else(|| ServiceError::validation("jwt is required"))?,
            self.otp_sender
                .unwrap_or_else(|| Arc::new(LoggingOtpSender)),
            self.rate_quotas
                .ok_or_else(|| ServiceError::validation("rate_quotas is required"))?,
            self.otp_config
                .ok_or_else(|| ServiceError::validation("otp_config is required"))?,
            self.session_config
                .ok_or_else(|| ServiceError::validation("session_config is required"))?,
            self.audit_config
                .ok_or_else(|| ServiceError::validation("audit_config is required"))?,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
