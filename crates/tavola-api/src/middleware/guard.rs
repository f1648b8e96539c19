//! Request guard stages for protected routes
//!
//! Ordered pipeline: authenticate (token extraction, validation, revocation
//! and session checks), then the per-user quota, then the role check, then
//! the permission check, then destructive confirmation. Each stage
//! short-circuits with its own status; authorization denials and quota hits
//! are written to the audit log.
//!
//! The permission stage is the one place the session's last-activity
//! timestamp is touched, so it happens exactly once per request.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejectionReason,
    TypedHeader,
};
use tavola_common::AppError;
use tavola_core::entities::{AuditLogEntry, Severity};
use tavola_core::value_objects::{Permission, Role, TenantId, UserId};
use tavola_service::services::rate_limit::user_key;
use tavola_service::{
    AuditService, AuthContext, RateLimitService, RbacService, RequestOrigin, ResourceRef,
    ServiceContext, TokenService,
};

use crate::extractors::client_origin;
use crate::response::{rate_limit_headers, ApiError};
use crate::state::AppState;

/// Header a caller must send to run a destructive operation
pub const CONFIRMATION_HEADER: &str = "x-destructive-confirmation";

/// Validate the bearer token and attach the authorization context.
///
/// Runs the token through signature, type, expiry, revocation, and session
/// liveness checks before anything downstream executes.
pub async fn authenticate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
            .await
            .map_err(|rejection| {
                if matches!(rejection.reason(), TypedHeaderRejectionReason::Missing) {
                    ApiError::App(AppError::MissingToken)
                } else {
                    ApiError::App(AppError::InvalidToken)
                }
            })?;

    let ctx = state.service_context();
    let claims = TokenService::new(ctx).validate_access(bearer.token()).await?;
    let auth = AuthContext::from_claims(&claims).map_err(ApiError::App)?;

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Authenticated-traffic quota, keyed by user id.
///
/// Runs inside the guard rather than ahead of it because the key is not
/// known until the token has been validated. The counter records the
/// attempt before the handler runs.
pub async fn user_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from_extensions(&request)?;
    let ctx = state.service_context();

    let quota = ctx.rate_quotas().authenticated;
    let check = RateLimitService::new(ctx)
        .check(&user_key(auth.user_id), quota)
        .await?;

    if !check.allowed {
        let origin = client_origin(request.headers(), request.extensions()).origin;
        audit_rate_limited(
            ctx,
            &origin,
            "authenticated",
            Some(auth.tenant_id),
            Some(auth.user_id),
        )
        .await;
        return Err(ApiError::RateLimited(check));
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(rate_limit_headers(&check));
    Ok(response)
}

/// Restrict a route group to the given roles
pub async fn require_role(
    State(state): State<AppState>,
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from_extensions(&request)?;
    let ctx = state.service_context();

    if let Err(e) = RbacService::new(ctx).require_role(&auth, allowed) {
        let required: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        audit_denied(ctx, &auth, &request, serde_json::json!({ "required_roles": required })).await;
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

/// Require a permission on the caller's own tenant.
///
/// Delegates to the RBAC ordered checks, which finish with the session
/// liveness re-check and the single last-activity touch for this request.
pub async fn require_permission(
    State(state): State<AppState>,
    permission: Permission,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from_extensions(&request)?;
    let ctx = state.service_context();

    let resource = ResourceRef::tenant(auth.tenant_id);
    if let Err(e) = RbacService::new(ctx)
        .validate_permission(&auth, permission, &resource)
        .await
    {
        if e.status_code() == 403 {
            audit_denied(
                ctx,
                &auth,
                &request,
                serde_json::json!({ "permission": permission.as_str() }),
            )
            .await;
        }
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

/// Refuse destructive operations without an explicit confirmation header
pub async fn require_confirmation(request: Request, next: Next) -> Result<Response, ApiError> {
    let confirmed = request
        .headers()
        .get(CONFIRMATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("confirmed"));

    if !confirmed {
        return Err(ApiError::App(AppError::ConfirmationRequired));
    }

    Ok(next.run(request).await)
}

/// Record a quota denial. Also used by the public auth handlers, whose
/// keys (phone, family) exist before any user is identified.
pub(crate) async fn audit_rate_limited(
    ctx: &ServiceContext,
    origin: &RequestOrigin,
    scope: &str,
    tenant_id: Option<TenantId>,
    user_id: Option<UserId>,
) {
    let mut entry = AuditLogEntry::new("ratelimit.exceeded", Severity::Medium)
        .with_details(serde_json::json!({ "scope": scope }))
        .with_origin(origin.ip.clone(), origin.user_agent.clone());
    if let Some(tenant_id) = tenant_id {
        entry = entry.with_tenant(tenant_id);
    }
    if let Some(user_id) = user_id {
        entry = entry.with_user(user_id);
    }
    AuditService::new(ctx).log(entry).await;
}

fn auth_from_extensions(request: &Request) -> Result<AuthContext, ApiError> {
    request
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(ApiError::App(AppError::MissingToken))
}

// Not an `async fn`: the request body is !Sync, so holding `&Request` as a
// parameter across the log await would make every calling guard future !Send.
// The request is read up front and the returned future captures only the entry.
fn audit_denied<'c>(
    ctx: &'c ServiceContext,
    auth: &AuthContext,
    request: &Request,
    mut details: serde_json::Value,
) -> impl std::future::Future<Output = ()> + Send + 'c {
    if let serde_json::Value::Object(map) = &mut details {
        map.insert("path".to_string(), request.uri().path().into());
    }
    let origin = client_origin(request.headers(), request.extensions()).origin;

    let entry = AuditLogEntry::new("authz.denied", Severity::Medium)
        .with_tenant(auth.tenant_id)
        .with_user(auth.user_id)
        .with_details(details)
        .with_origin(origin.ip, origin.user_agent);

    async move {
        AuditService::new(ctx).log(entry).await;
    }
}
