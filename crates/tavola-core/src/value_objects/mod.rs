//! Value objects - immutable types that represent domain concepts

mod ids;
mod permissions;
mod phone;
mod role;

pub use ids::{FamilyId, SessionId, TenantId, UserId};
pub use permissions::{
    can_manage_role, manageable_roles, permissions_for, role_has_permission, Permission,
    ROLE_PERMISSIONS,
};
pub use phone::normalize_phone;
pub use role::{Role, RoleParseError};
