//! Token family entity <-> model mapper

use tavola_core::entities::TokenFamily;
use tavola_core::value_objects::{FamilyId, SessionId, TenantId, UserId};

use crate::models::TokenFamilyModel;

impl From<TokenFamilyModel> for TokenFamily {
    fn from(model: TokenFamilyModel) -> Self {
        TokenFamily {
            id: FamilyId::from(model.id),
            user_id: UserId::from(model.user_id),
            session_id: SessionId::from(model.session_id),
            tenant_id: TenantId::from(model.tenant_id),
            current_jti: model.current_jti,
            fingerprint: model.fingerprint,
            created_at: model.created_at,
            rotated_at: model.rotated_at,
            revoked: model.revoked,
        }
    }
}
