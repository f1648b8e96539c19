//! Audit log handlers
//!
//! Read access to the tenant's audit trail and the retention purge.
//! Queries are always scoped to the caller's tenant; there is no way to
//! read another tenant's trail from here.

use axum::{
    extract::{Query, State},
    Json,
};
use tavola_core::entities::{AuditLogEntry, Severity};
use tavola_core::traits::AuditQuery;
use tavola_core::value_objects::UserId;
use tavola_service::dto::{AuditLogQuery, AuditLogResponse, PurgedResponse, SecurityEventsQuery};
use tavola_service::AuditService;

use crate::extractors::{Authenticated, ClientOrigin};
use crate::response::ApiResult;
use crate::state::AppState;

/// Query the tenant's audit log
///
/// GET /audit/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditLogResponse>>> {
    let service = AuditService::new(state.service_context());
    let entries = service
        .query(AuditQuery {
            tenant_id: Some(auth.tenant_id),
            user_id: query.user_id.map(UserId::from),
            action_contains: query.action,
            min_severity: query.min_severity,
            from: query.from,
            to: query.to,
            limit: query.limit.unwrap_or(0),
            offset: query.offset.unwrap_or(0),
        })
        .await?;

    Ok(Json(entries.into_iter().map(AuditLogResponse::from).collect()))
}

/// Recent high-severity events for the tenant
///
/// GET /audit/security-events
pub async fn security_events(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    Query(query): Query<SecurityEventsQuery>,
) -> ApiResult<Json<Vec<AuditLogResponse>>> {
    let service = AuditService::new(state.service_context());
    let entries = service
        .security_events(auth.tenant_id, query.hours.unwrap_or(24))
        .await?;

    Ok(Json(entries.into_iter().map(AuditLogResponse::from).collect()))
}

/// Purge audit entries past the retention window
///
/// DELETE /audit/retention
pub async fn purge_retention(
    State(state): State<AppState>,
    Authenticated(auth): Authenticated,
    client: ClientOrigin,
) -> ApiResult<Json<PurgedResponse>> {
    let service = AuditService::new(state.service_context());
    let purged = service.purge_expired().await?;

    service
        .log(
            AuditLogEntry::new("audit.purged", Severity::Medium)
                .with_tenant(auth.tenant_id)
                .with_user(auth.user_id)
                .with_details(serde_json::json!({ "purged": purged }))
                .with_origin(client.origin.ip.clone(), client.origin.user_agent.clone()),
        )
        .await;

    Ok(Json(PurgedResponse { purged }))
}
