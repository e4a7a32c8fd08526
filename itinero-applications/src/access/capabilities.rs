//! Capability flags derived from role
//!
//! Presentation-layer conveniences computed deterministically from role.
//! These are never stored; clients receive them alongside user payloads and
//! key UI behavior off them.

use itinero_core::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub is_super_user: bool,
    pub can_manage_users: bool,
    pub can_access_system: bool,
    pub can_export_data: bool,
    pub can_view_audit_logs: bool,
}

impl Capabilities {
    pub fn for_role(role: Role) -> Self {
        let admin_tier = role.is_admin_tier();
        Self {
            is_super_user: role == Role::Super,
            can_manage_users: admin_tier,
            can_access_system: admin_tier,
            can_export_data: admin_tier,
            can_view_audit_logs: role == Role::Super,
        }
    }
}
