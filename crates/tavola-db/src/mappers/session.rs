//! Session entity <-> model mapper

use tavola_core::entities::Session;
use tavola_core::value_objects::{SessionId, TenantId, UserId};

use crate::models::SessionModel;

impl From<SessionModel> for Session {
    fn from(model: SessionModel) -> Self {
        Session {
            id: SessionId::from(model.id),
            user_id: UserId::from(model.user_id),
            tenant_id: TenantId::from(model.tenant_id),
            fingerprint: model.fingerprint,
            created_at: model.created_at,
            last_activity_at: model.last_activity_at,
            revoked: model.revoked,
            revoked_at: model.revoked_at,
        }
    }
}
