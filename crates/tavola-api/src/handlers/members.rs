//! Tenant member handlers
//!
//! Role administration within a tenant. Changing someone's role takes
//! effect by revoking their sessions, so the service reports how many
//! were cut.

use axum::{
    extract::{Path, State},
    Json,
};
use tavola_core::value_objects::{TenantId, UserId};
use tavola_service::dto::{ChangeRoleRequest, RoleChangedResponse};
use tavola_service::AccountService;

use crate::extractors::{Authenticated, ClientOrigin};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// Change a member's role
///
/// PUT /tenants/:tenant_id/members/:user_id/role
pub async fn change_member_role(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    client: ClientOrigin,
    Path((tenant_id, user_id)): Path<(String, String)>,
    Json(request): Json<ChangeRoleRequest>,
) -> ApiResult<Json<RoleChangedResponse>> {
    let tenant_id = tenant_id
        .parse::<TenantId>()
        .map_err(|_| ApiError::invalid_path("Invalid tenant ID format"))?;
    let user_id = user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::invalid_path("Invalid user ID format"))?;

    let service = AccountService::new(state.service_context());
    let response = service
        .change_role(&auth, tenant_id, user_id, request.role, &client.origin)
        .await?;
    Ok(Json(response))
}
