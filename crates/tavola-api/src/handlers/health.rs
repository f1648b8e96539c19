//! Health check handlers
//!
//! Endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use tavola_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Basic health check (liveness probe)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness check with dependency health.
///
/// The in-process backend has no external dependencies and always
/// reports ready.
///
/// GET /health/ready
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let backends = state.backends();

    let db_healthy = match backends.db.as_ref() {
        Some(pool) => pool.acquire().await.is_ok(),
        None => true,
    };
    let cache_healthy = match backends.redis.as_ref() {
        Some(pool) => pool.health_check().await.is_ok(),
        None => true,
    };

    let response = ReadinessResponse::ready(db_healthy, cache_healthy);
    let status = if db_healthy && cache_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
