//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1. The
//! guard stages are attached as route layers; axum runs the layer added
//! last first, so each group lists its layers innermost to outermost.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    routing::{delete, get, post, put},
    Router,
};
use tavola_core::value_objects::{Permission, Role};

use crate::handlers::{audit, auth, health, members, orders, otp, sessions};
use crate::middleware::guard;
use crate::state::AppState;

/// Create the main API router with all routes (excluding health, which
/// stays outside the guard entirely)
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes(state))
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_auth_routes())
        .merge(protected_routes(state))
}

/// Routes reachable without a token.
///
/// Login, refresh, and the OTP endpoints rate limit themselves inside
/// the handler, where the phone or family key is known.
fn public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/otp/request", post(otp::request_code))
        .route("/auth/otp/verify", post(otp::verify_code))
}

/// Routes behind the full guard chain.
///
/// The two layers here run before any group-specific layer: first the
/// token check, then the per-user quota.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(session_routes(state.clone()))
        .merge(order_routes(state.clone()))
        .merge(member_routes(state.clone()))
        .merge(audit_routes(state.clone()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::user_rate_limit,
        ))
        .route_layer(middleware::from_fn_with_state(state, guard::authenticate))
}

/// Session management, plus logout, which acts on the caller's session
fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions", delete(sessions::revoke_other_sessions))
        .route("/sessions/:session_id", delete(sessions::revoke_session))
        .route_layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_permission(state, Permission::SessionManageOwn, request, next)
            },
        ))
}

/// The storefront ordering endpoint
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::place_order))
        .route_layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_permission(state, Permission::OrderPlace, request, next)
            },
        ))
}

/// Tenant member administration
fn member_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/:tenant_id/members/:user_id/role",
            put(members::change_member_role),
        )
        .route_layer(middleware::from_fn(guard::require_confirmation))
        .route_layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_permission(state, Permission::MemberManage, request, next)
            },
        ))
}

/// Audit trail access
fn audit_routes(state: AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/audit/logs", get(audit::list_logs))
        .route("/audit/security-events", get(audit::security_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_permission(state, Permission::AuditView, request, next)
            },
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_role(state, &[Role::Manager, Role::Owner], request, next)
            },
        ));

    let purge = Router::new()
        .route("/audit/retention", delete(audit::purge_retention))
        .route_layer(middleware::from_fn(guard::require_confirmation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_permission(state, Permission::AuditPurge, request, next)
            },
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, request: Request, next: Next| {
                guard::require_role(state, &[Role::Owner], request, next)
            },
        ));

    read.merge(purge)
}
