//! User entity - a platform account scoped to one tenant

use chrono::{DateTime, Utc};

use crate::value_objects::{Role, TenantId, UserId};

/// User account within a tenant.
///
/// The credential hash is not part of the entity; the repository carries it
/// so that user values can move through services and logs freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub phone: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with a generated id.
    ///
    /// `phone` must already be normalized.
    pub fn new(tenant_id: TenantId, phone: String, display_name: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            tenant_id,
            phone,
            display_name,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change the user's role
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }
}
