//! User entity <-> model mapper

use tavola_core::entities::User;
use tavola_core::error::DomainError;
use tavola_core::value_objects::{Role, TenantId, UserId};

use crate::models::UserModel;

/// Convert UserModel to User entity.
///
/// Fallible because the role column is free text; an unknown value means
/// the row was written by a newer schema and must not be silently coerced.
impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let role: Role = model
            .role
            .parse()
            .map_err(|_| DomainError::InvalidRole(model.role.clone()))?;

        Ok(User {
            id: UserId::from(model.id),
            tenant_id: TenantId::from(model.tenant_id),
            phone: model.phone,
            display_name: model.display_name,
            role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_model(role: &str) -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            phone: "+14155550100".to_string(),
            display_name: "Dana".to_string(),
            role: role.to_string(),
            password_hash: "$argon2$hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_known_role_maps() {
        let user = User::try_from(sample_model("manager")).unwrap();
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        assert!(matches!(
            User::try_from(sample_model("superuser")),
            Err(DomainError::InvalidRole(_))
        ));
    }
}
