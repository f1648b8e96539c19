//! Authentication handlers
//!
//! Endpoints for account registration, credential login, token refresh,
//! and logout. Login and refresh count against their rate limit keys
//! before any credential or token work happens, so failed attempts
//! consume quota too.

use axum::{extract::State, http::HeaderMap, Json};
use tavola_common::AppError;
use tavola_core::normalize_phone;
use tavola_service::dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse};
use tavola_service::services::rate_limit::{login_key, refresh_key};
use tavola_service::{AccountService, RateLimitService, TokenService};

use crate::extractors::{Authenticated, ClientOrigin, OptionalValidatedJson, ValidatedJson};
use crate::middleware::guard;
use crate::response::{ApiError, ApiResult, Created, Limited, NoContent};
use crate::state::AppState;

/// Fallback header for clients that cannot send the refresh token in a body
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Register a new account
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    client: ClientOrigin,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<AuthResponse>>> {
    let service = AccountService::new(state.service_context());
    let response = service
        .register(request, client.fingerprint, &client.origin)
        .await?;
    Ok(Created(Json(response)))
}

/// Login with phone and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientOrigin,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Limited<Json<AuthResponse>>> {
    let ctx = state.service_context();
    let phone = normalize_phone(&request.phone)?;
    let ip = client.origin.ip.as_deref().unwrap_or("unknown");

    let check = RateLimitService::new(ctx)
        .check(&login_key(&phone, ip), ctx.rate_quotas().login)
        .await?;
    if !check.allowed {
        guard::audit_rate_limited(ctx, &client.origin, "login", None, None).await;
        return Err(ApiError::RateLimited(check));
    }

    let response = AccountService::new(ctx)
        .login(request, client.fingerprint, &client.origin)
        .await?;
    Ok(Limited(check, Json(response)))
}

/// Rotate a refresh token into a fresh pair.
///
/// The token comes from the JSON body or, failing that, the
/// `x-refresh-token` header. The rate limit key is the token's family,
/// so a stolen token cannot exhaust anyone else's quota.
///
/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    client: ClientOrigin,
    body: OptionalValidatedJson<RefreshRequest>,
) -> ApiResult<Limited<Json<TokenResponse>>> {
    let ctx = state.service_context();

    let from_header = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let token = body
        .0
        .and_then(|request| request.refresh_token)
        .or(from_header)
        .ok_or(ApiError::App(AppError::MissingToken))?;

    // Decode up front to learn the family; signature or expiry problems
    // surface here before any quota is spent.
    let claims = ctx.jwt().decode_refresh_token(&token)?;
    let family_id = claims.family_id()?;

    let check = RateLimitService::new(ctx)
        .check(&refresh_key(family_id), ctx.rate_quotas().refresh)
        .await?;
    if !check.allowed {
        guard::audit_rate_limited(ctx, &client.origin, "refresh", None, None).await;
        return Err(ApiError::RateLimited(check));
    }

    let issued = TokenService::new(ctx)
        .rotate(&token, client.fingerprint.as_deref())
        .await?;
    Ok(Limited(check, Json(TokenResponse::from(issued.tokens))))
}

/// Logout the current session
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    client: ClientOrigin,
) -> ApiResult<NoContent> {
    let service = AccountService::new(state.service_context());
    service.logout(&auth, &client.origin).await?;
    Ok(NoContent)
}
