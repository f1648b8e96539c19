//! Role-based access control service
//!
//! Authorization decisions for authenticated requests. The role to
//! permission mapping itself lives in `tavola-core`; this service layers
//! the contextual checks on top: tenant isolation, customer ownership,
//! and session liveness.

use chrono::Utc;
use tavola_common::{AppError, Claims};
use tavola_core::value_objects::{
    can_manage_role, role_has_permission, Permission, Role, SessionId, TenantId, UserId,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authenticated caller, extracted from validated access token claims
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub session_id: SessionId,
    pub token_id: Uuid,
}

impl AuthContext {
    /// Build from claims that already passed `validate_access`
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            tenant_id: claims.tenant_id()?,
            role: claims.role,
            session_id: claims.session_id()?,
            token_id: claims.token_id()?,
        })
    }
}

/// The resource an operation is about to act on
#[derive(Debug, Clone, Copy)]
pub struct ResourceRef {
    pub tenant_id: TenantId,
    /// Owning user, when the resource has one
    pub owner_id: Option<UserId>,
}

impl ResourceRef {
    /// A tenant-scoped resource with no individual owner
    #[must_use]
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            owner_id: None,
        }
    }

    /// A resource owned by one user within a tenant
    #[must_use]
    pub fn owned(tenant_id: TenantId, owner_id: UserId) -> Self {
        Self {
            tenant_id,
            owner_id: Some(owner_id),
        }
    }
}

/// Role-based access control service
pub struct RbacService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RbacService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Pure role-to-permission lookup
    #[must_use]
    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        role_has_permission(role, permission)
    }

    /// Full authorization check for one operation, in order: permission
    /// for the role, tenant isolation, customer ownership, session
    /// liveness. Passing also touches the session's last-activity time.
    #[instrument(skip(self, auth, resource), fields(user_id = %auth.user_id, permission = ?permission))]
    pub async fn validate_permission(
        &self,
        auth: &AuthContext,
        permission: Permission,
        resource: &ResourceRef,
    ) -> ServiceResult<()> {
        if !role_has_permission(auth.role, permission) {
            debug!(role = auth.role.as_str(), "Permission not granted to role");
            return Err(ServiceError::App(AppError::InsufficientPermission));
        }

        // Tenant isolation is absolute; no role crosses it
        if resource.tenant_id != auth.tenant_id {
            warn!(
                token_tenant = %auth.tenant_id,
                resource_tenant = %resource.tenant_id,
                "Cross-tenant access denied"
            );
            return Err(ServiceError::App(AppError::TenantMismatch));
        }

        if auth.role == Role::Customer {
            if let Some(owner_id) = resource.owner_id {
                if owner_id != auth.user_id {
                    return Err(ServiceError::App(AppError::InsufficientPermission));
                }
            }
        }

        self.touch_live_session(auth.session_id).await
    }

    /// Require the caller's role to be one of `allowed`
    pub fn require_role(&self, auth: &AuthContext, allowed: &[Role]) -> ServiceResult<()> {
        if allowed.contains(&auth.role) {
            Ok(())
        } else {
            Err(ServiceError::App(AppError::InsufficientRole))
        }
    }

    /// Whether `actor` may assign or remove `target`
    #[must_use]
    pub fn can_manage_role(&self, actor: Role, target: Role) -> bool {
        can_manage_role(actor, target)
    }

    /// The session must still be live; a pass counts as activity
    async fn touch_live_session(&self, session_id: SessionId) -> ServiceResult<()> {
        let session = self
            .ctx
            .sessions()
            .find_by_id(session_id)
            .await?
            .ok_or(ServiceError::App(AppError::TokenRevoked))?;
        if !session.is_live() {
            return Err(ServiceError::App(AppError::TokenRevoked));
        }

        self.ctx.sessions().touch(session_id, Utc::now()).await?;
        Ok(())
    }
}
