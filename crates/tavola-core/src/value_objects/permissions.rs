//! Permission catalogue and the role-to-permission table
//!
//! The table is flat data: each role maps to an explicit list of
//! permissions. There is no inheritance chain in code; the ladder
//! (owner covers manager covers staff) is encoded by listing the
//! permissions out, which keeps the mapping greppable and testable.

use serde::{Deserialize, Serialize};

use super::Role;

/// Fine-grained actions a role can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Place a new order (storefront)
    OrderPlace,
    /// View orders the caller placed
    OrderViewOwn,
    /// Cancel an order the caller placed
    OrderCancelOwn,
    /// View every order in the tenant
    OrderViewAll,
    /// Advance an order through the kitchen workflow
    OrderUpdateStatus,
    /// View deliveries assigned to the caller
    DeliveryViewAssigned,
    /// Update the status of an assigned delivery
    DeliveryUpdateStatus,
    /// Edit the tenant's menu
    MenuEdit,
    /// Issue a refund
    RefundIssue,
    /// View sales and operations reports
    ReportView,
    /// Manage staff and courier accounts
    MemberManage,
    /// Edit tenant-wide settings
    TenantSettingsEdit,
    /// Read the audit log
    AuditView,
    /// Purge audit entries past retention
    AuditPurge,
    /// Edit the caller's own profile
    ProfileManageOwn,
    /// List and revoke the caller's own sessions
    SessionManageOwn,
}

impl Permission {
    /// Stable string form, matching the serialized representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::OrderPlace => "order_place",
            Permission::OrderViewOwn => "order_view_own",
            Permission::OrderCancelOwn => "order_cancel_own",
            Permission::OrderViewAll => "order_view_all",
            Permission::OrderUpdateStatus => "order_update_status",
            Permission::DeliveryViewAssigned => "delivery_view_assigned",
            Permission::DeliveryUpdateStatus => "delivery_update_status",
            Permission::MenuEdit => "menu_edit",
            Permission::RefundIssue => "refund_issue",
            Permission::ReportView => "report_view",
            Permission::MemberManage => "member_manage",
            Permission::TenantSettingsEdit => "tenant_settings_edit",
            Permission::AuditView => "audit_view",
            Permission::AuditPurge => "audit_purge",
            Permission::ProfileManageOwn => "profile_manage_own",
            Permission::SessionManageOwn => "session_manage_own",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permissions held by every role regardless of rank
const COMMON: [Permission; 2] = [Permission::ProfileManageOwn, Permission::SessionManageOwn];

const CUSTOMER_PERMISSIONS: [Permission; 5] = [
    Permission::OrderPlace,
    Permission::OrderViewOwn,
    Permission::OrderCancelOwn,
    COMMON[0],
    COMMON[1],
];

const COURIER_PERMISSIONS: [Permission; 4] = [
    Permission::DeliveryViewAssigned,
    Permission::DeliveryUpdateStatus,
    COMMON[0],
    COMMON[1],
];

const STAFF_PERMISSIONS: [Permission; 4] = [
    Permission::OrderViewAll,
    Permission::OrderUpdateStatus,
    COMMON[0],
    COMMON[1],
];

const MANAGER_PERMISSIONS: [Permission; 9] = [
    Permission::OrderViewAll,
    Permission::OrderUpdateStatus,
    Permission::MenuEdit,
    Permission::RefundIssue,
    Permission::ReportView,
    Permission::MemberManage,
    Permission::AuditView,
    COMMON[0],
    COMMON[1],
];

const OWNER_PERMISSIONS: [Permission; 11] = [
    Permission::OrderViewAll,
    Permission::OrderUpdateStatus,
    Permission::MenuEdit,
    Permission::RefundIssue,
    Permission::ReportView,
    Permission::MemberManage,
    Permission::AuditView,
    Permission::TenantSettingsEdit,
    Permission::AuditPurge,
    COMMON[0],
    COMMON[1],
];

/// The role-to-permission table
pub const ROLE_PERMISSIONS: [(Role, &[Permission]); 5] = [
    (Role::Customer, &CUSTOMER_PERMISSIONS),
    (Role::Courier, &COURIER_PERMISSIONS),
    (Role::Staff, &STAFF_PERMISSIONS),
    (Role::Manager, &MANAGER_PERMISSIONS),
    (Role::Owner, &OWNER_PERMISSIONS),
];

/// Permissions granted to `role`
#[must_use]
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Customer => &CUSTOMER_PERMISSIONS,
        Role::Courier => &COURIER_PERMISSIONS,
        Role::Staff => &STAFF_PERMISSIONS,
        Role::Manager => &MANAGER_PERMISSIONS,
        Role::Owner => &OWNER_PERMISSIONS,
    }
}

/// Pure table lookup: does `role` hold `permission`?
#[must_use]
pub fn role_has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// Roles an actor of `role` may create, demote, or deactivate.
///
/// Owners manage every role below them but not other owners;
/// managers handle day-to-day staffing; nobody else manages anyone.
#[must_use]
pub fn manageable_roles(role: Role) -> &'static [Role] {
    match role {
        Role::Owner => &[Role::Customer, Role::Courier, Role::Staff, Role::Manager],
        Role::Manager => &[Role::Staff, Role::Courier],
        Role::Customer | Role::Courier | Role::Staff => &[],
    }
}

/// Can `actor` manage accounts holding `target`?
#[must_use]
pub fn can_manage_role(actor: Role, target: Role) -> bool {
    manageable_roles(actor).contains(&target)
}
