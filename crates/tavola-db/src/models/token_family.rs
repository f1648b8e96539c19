//! Token family database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the token_families table
#[derive(Debug, Clone, FromRow)]
pub struct TokenFamilyModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub tenant_id: Uuid,
    pub current_jti: Uuid,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub rotated_at: DateTime<Utc>,
    pub revoked: bool,
}
