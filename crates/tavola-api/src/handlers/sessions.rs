//! Session management handlers
//!
//! Endpoints for listing the caller's devices and signing them out,
//! one at a time or all but the current one.

use axum::{
    extract::{Path, State},
    Json,
};
use tavola_core::value_objects::SessionId;
use tavola_service::dto::{RevokedSessionsResponse, SessionResponse};
use tavola_service::AccountService;

use crate::extractors::{Authenticated, ClientOrigin};
use crate::response::{ApiError, ApiResult, NoContent};
use crate::state::AppState;

/// List the caller's live sessions
///
/// GET /sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let service = AccountService::new(state.service_context());
    let sessions = service.list_sessions(&auth).await?;

    let response = sessions
        .iter()
        .map(|session| SessionResponse::from_session(session, auth.session_id))
        .collect();
    Ok(Json(response))
}

/// Revoke one of the caller's sessions
///
/// DELETE /sessions/:session_id
pub async fn revoke_session(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    client: ClientOrigin,
    Path(session_id): Path<String>,
) -> ApiResult<NoContent> {
    let session_id = session_id
        .parse::<SessionId>()
        .map_err(|_| ApiError::invalid_path("Invalid session ID format"))?;

    let service = AccountService::new(state.service_context());
    service
        .revoke_session(&auth, session_id, &client.origin)
        .await?;
    Ok(NoContent)
}

/// Revoke every session except the current one
///
/// DELETE /sessions
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    client: ClientOrigin,
) -> ApiResult<Json<RevokedSessionsResponse>> {
    let service = AccountService::new(state.service_context());
    let revoked = service.revoke_other_sessions(&auth, &client.origin).await?;
    Ok(Json(RevokedSessionsResponse { revoked }))
}
