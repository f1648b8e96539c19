//! Session database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the sessions table
#[derive(Debug, Clone, FromRow)]
pub struct SessionModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}
