//! Role value object - the five platform roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a user within a tenant.
///
/// `Owner`, `Manager`, and `Staff` form a widening ladder of back-office
/// access. `Courier` is an operational role with its own delivery
/// permissions, and `Customer` is the storefront role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Courier,
    Staff,
    Manager,
    Owner,
}

impl Role {
    /// Every role, in ascending order of back-office access
    pub const ALL: [Role; 5] = [
        Role::Customer,
        Role::Courier,
        Role::Staff,
        Role::Manager,
        Role::Owner,
    ];

    /// Stable string form, matching the serialized representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Courier => "courier",
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "courier" => Ok(Role::Courier),
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "owner" => Ok(Role::Owner),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
