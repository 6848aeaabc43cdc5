/// Admin Role Management
use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Admin roles
///
/// Each role owns one area of the admin panel. `SuperAdmin` may act in all
/// of them; every other role only in its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    RegistrationAdmin,
    InventoryAdmin,
    /// Head of committee: sport coordinators
    HocAdmin,
    FinanceAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::RegistrationAdmin => "registration_admin",
            Role::InventoryAdmin => "inventory_admin",
            Role::HocAdmin => "hoc_admin",
            Role::FinanceAdmin => "finance_admin",
        }
    }

    /// Check if this role can perform actions requiring another role
    pub fn can_act_as(&self, required: Role) -> bool {
        *self == Role::SuperAdmin || *self == required
    }

    /// Admin panel page a freshly logged-in user lands on
    pub fn default_landing(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "/admin/dashboard",
            Role::RegistrationAdmin => "/admin/registrations",
            Role::InventoryAdmin => "/admin/inventory",
            Role::HocAdmin => "/admin/hoc",
            Role::FinanceAdmin => "/admin/finance",
        }
    }

    /// Human label used in forbidden messages
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::RegistrationAdmin => "Registration Admin",
            Role::InventoryAdmin => "Inventory Admin",
            Role::HocAdmin => "HOC Admin",
            Role::FinanceAdmin => "Finance Admin",
        }
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> PortalResult<Self> {
        match s.trim().to_lowercase().as_str() {
            // Rows created before roles were split carry plain "admin"
            "super_admin" | "admin" => Ok(Role::SuperAdmin),
            "registration_admin" => Ok(Role::RegistrationAdmin),
            "inventory_admin" => Ok(Role::InventoryAdmin),
            "hoc_admin" => Ok(Role::HocAdmin),
            "finance_admin" => Ok(Role::FinanceAdmin),
            _ => Err(PortalError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

/// Landing page for a role string as stored in the database
pub fn landing_for(role: &str) -> &'static str {
    role.parse::<Role>()
        .map(|r| r.default_landing())
        .unwrap_or(Role::SuperAdmin.default_landing())
}
