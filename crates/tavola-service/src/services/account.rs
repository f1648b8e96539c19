//! Account service
//!
//! Registration, credential and OTP login, logout, session management,
//! and tenant member role changes. Token mechanics are delegated to
//! `TokenService`; this layer owns the user-facing flows and their audit
//! trail.

use tavola_common::{
    hash_password, validate_password_strength, verify_password, AppError,
};
use tavola_core::entities::{AuditLogEntry, Session, Severity, User};
use tavola_core::value_objects::{Role, SessionId, TenantId, UserId};
use tavola_core::{normalize_phone, DomainError};
use tracing::{info, instrument, warn};

use super::audit::{AuditService, RequestOrigin};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::rbac::{AuthContext, RbacService};
use super::token::TokenService;
use crate::dto::responses::RoleChangedResponse;
use crate::dto::{AuthResponse, LoginRequest, RegisterRequest};

/// Account service
pub struct AccountService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AccountService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a customer account and sign it in.
    ///
    /// New accounts always start as customers; staff roles are assigned
    /// afterwards through the role change flow.
    #[instrument(skip_all, fields(tenant_id = %request.tenant_id))]
    pub async fn register(
        &self,
        request: RegisterRequest,
        fingerprint: Option<String>,
        origin: &RequestOrigin,
    ) -> ServiceResult<AuthResponse> {
        let tenant_id = TenantId::from(request.tenant_id);
        let phone = normalize_phone(&request.phone)?;
        validate_password_strength(&request.password)?;

        if self.ctx.users().phone_exists(tenant_id, &phone).await? {
            return Err(ServiceError::Domain(DomainError::PhoneAlreadyExists));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(tenant_id, phone, request.display_name, Role::Customer);
        self.ctx.users().create(&user, &password_hash).await?;

        let response = self.open_session(&user, fingerprint).await?;

        info!(user_id = %user.id, "Account registered");
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("auth.register", Severity::Low)
                    .with_tenant(tenant_id)
                    .with_user(user.id)
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(response)
    }

    /// Password login: fresh session, fresh token family.
    ///
    /// Unknown phone and wrong password are indistinguishable to the
    /// caller.
    #[instrument(skip_all, fields(tenant_id = %request.tenant_id))]
    pub async fn login(
        &self,
        request: LoginRequest,
        fingerprint: Option<String>,
        origin: &RequestOrigin,
    ) -> ServiceResult<AuthResponse> {
        let tenant_id = TenantId::from(request.tenant_id);
        let phone = normalize_phone(&request.phone)?;

        let user = self.ctx.users().find_by_phone(tenant_id, &phone).await?;
        let Some(user) = user else {
            self.log_login_failure(tenant_id, None, origin).await;
            return Err(ServiceError::App(AppError::InvalidCredentials));
        };

        let stored_hash = self.ctx.users().get_password_hash(user.id).await?;
        let verified = match stored_hash {
            Some(hash) => verify_password(&request.password, &hash)?,
            // OTP-only accounts have no password credential
            None => false,
        };
        if !verified {
            self.log_login_failure(tenant_id, Some(user.id), origin).await;
            return Err(ServiceError::App(AppError::InvalidCredentials));
        }

        let response = self.open_session(&user, fingerprint).await?;

        info!(user_id = %user.id, "Login succeeded");
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("auth.login", Severity::Low)
                    .with_tenant(tenant_id)
                    .with_user(user.id)
                    .with_details(serde_json::json!({ "method": "password" }))
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(response)
    }

    /// Complete a login whose OTP code already verified.
    ///
    /// `phone` must be the normalized phone returned by `OtpService::verify`.
    #[instrument(skip_all, fields(tenant_id = %tenant_id))]
    pub async fn login_with_otp(
        &self,
        tenant_id: TenantId,
        phone: &str,
        fingerprint: Option<String>,
        origin: &RequestOrigin,
    ) -> ServiceResult<AuthResponse> {
        let user = self
            .ctx
            .users()
            .find_by_phone(tenant_id, phone)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidCredentials))?;

        let response = self.open_session(&user, fingerprint).await?;

        info!(user_id = %user.id, "OTP login succeeded");
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("auth.login", Severity::Low)
                    .with_tenant(tenant_id)
                    .with_user(user.id)
                    .with_details(serde_json::json!({ "method": "otp" }))
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(response)
    }

    /// Revoke the caller's current session and its token families
    #[instrument(skip_all, fields(user_id = %auth.user_id))]
    pub async fn logout(&self, auth: &AuthContext, origin: &RequestOrigin) -> ServiceResult<()> {
        TokenService::new(self.ctx)
            .revoke_session(auth.session_id)
            .await?;

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("auth.logout", Severity::Low)
                    .with_tenant(auth.tenant_id)
                    .with_user(auth.user_id)
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(())
    }

    /// The caller's live sessions, newest first
    pub async fn list_sessions(&self, auth: &AuthContext) -> ServiceResult<Vec<Session>> {
        let sessions = self.ctx.sessions().find_by_user(auth.user_id).await?;
        Ok(sessions.into_iter().filter(Session::is_live).collect())
    }

    /// Revoke one of the caller's own sessions.
    ///
    /// A session that does not exist and a session belonging to someone
    /// else look the same from outside.
    #[instrument(skip_all, fields(user_id = %auth.user_id, session_id = %session_id))]
    pub async fn revoke_session(
        &self,
        auth: &AuthContext,
        session_id: SessionId,
        origin: &RequestOrigin,
    ) -> ServiceResult<()> {
        let session = self.ctx.sessions().find_by_id(session_id).await?;
        let owned = session.is_some_and(|s| s.user_id == auth.user_id);
        if !owned {
            return Err(ServiceError::not_found("Session", session_id.to_string()));
        }

        TokenService::new(self.ctx).revoke_session(session_id).await?;

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("session.revoked", Severity::Low)
                    .with_tenant(auth.tenant_id)
                    .with_user(auth.user_id)
                    .with_details(serde_json::json!({ "session_id": session_id.to_string() }))
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(())
    }

    /// Revoke every session of the caller except the current one.
    /// Returns how many were revoked.
    #[instrument(skip_all, fields(user_id = %auth.user_id))]
    pub async fn revoke_other_sessions(
        &self,
        auth: &AuthContext,
        origin: &RequestOrigin,
    ) -> ServiceResult<u64> {
        let revoked = TokenService::new(self.ctx)
            .revoke_all_sessions(auth.user_id, Some(auth.session_id))
            .await?;

        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("session.revoked_all", Severity::Medium)
                    .with_tenant(auth.tenant_id)
                    .with_user(auth.user_id)
                    .with_details(serde_json::json!({ "revoked": revoked }))
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(revoked)
    }

    /// Change a member's role within the caller's tenant.
    ///
    /// The caller must be allowed to manage both the member's current role
    /// and the new one. The member's sessions are all revoked; their next
    /// login carries the new role.
    #[instrument(skip_all, fields(actor = %auth.user_id, target = %target_id))]
    pub async fn change_role(
        &self,
        auth: &AuthContext,
        tenant_id: TenantId,
        target_id: UserId,
        new_role: Role,
        origin: &RequestOrigin,
    ) -> ServiceResult<RoleChangedResponse> {
        if tenant_id != auth.tenant_id {
            return Err(ServiceError::App(AppError::TenantMismatch));
        }

        let target = self.ctx.users().find_by_id(target_id).await?;
        let target = match target {
            Some(user) if user.tenant_id == tenant_id => user,
            // Members of other tenants do not exist from here
            _ => return Err(ServiceError::not_found("User", target_id.to_string())),
        };

        let rbac = RbacService::new(self.ctx);
        if !rbac.can_manage_role(auth.role, target.role)
            || !rbac.can_manage_role(auth.role, new_role)
        {
            warn!(
                actor_role = auth.role.as_str(),
                target_role = target.role.as_str(),
                new_role = new_role.as_str(),
                "Role change denied"
            );
            return Err(ServiceError::App(AppError::InsufficientRole));
        }

        self.ctx.users().update_role(target.id, new_role).await?;
        let revoked = TokenService::new(self.ctx)
            .revoke_all_sessions(target.id, None)
            .await?;

        info!(
            from = target.role.as_str(),
            to = new_role.as_str(),
            revoked_sessions = revoked,
            "Member role changed"
        );
        AuditService::new(self.ctx)
            .log(
                AuditLogEntry::new("member.role_changed", Severity::Medium)
                    .with_tenant(tenant_id)
                    .with_user(auth.user_id)
                    .with_details(serde_json::json!({
                        "target_user_id": target.id.to_string(),
                        "from": target.role.as_str(),
                        "to": new_role.as_str(),
                        "revoked_sessions": revoked,
                    }))
                    .with_origin(origin.ip.clone(), origin.user_agent.clone()),
            )
            .await;

        Ok(RoleChangedResponse {
            user_id: target.id.as_uuid(),
            role: new_role,
            revoked_sessions: revoked,
        })
    }

    async fn open_session(
        &self,
        user: &User,
        fingerprint: Option<String>,
    ) -> ServiceResult<AuthResponse> {
        let session = Session::new(user.id, user.tenant_id, fingerprint);
        self.ctx.sessions().insert(&session).await?;

        let issued = TokenService::new(self.ctx).issue(user, &session).await?;
        Ok(AuthResponse::new(issued.tokens, user))
    }

    async fn log_login_failure(
        &self,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        origin: &RequestOrigin,
    ) {
        let mut entry = AuditLogEntry::new("auth.login_failed", Severity::Medium)
            .with_tenant(tenant_id)
            .with_origin(origin.ip.clone(), origin.user_agent.clone());
        if let Some(user_id) = user_id {
            entry = entry.with_user(user_id);
        }
        AuditService::new(self.ctx).log(entry).await;
    }
}
