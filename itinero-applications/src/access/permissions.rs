//! Default permission sets and boundary validation
//!
//! Permission tags arriving from the outside world are free-form strings;
//! they are parsed into the closed [`Permission`] enumeration here, at the
//! boundary, and never trusted as opaque strings further in.

use itinero_core::{validation_error, ItineroError, ItineroResult, Permission, Role};

/// Default permission set for a role
///
/// An explicit permission set supplied at creation time replaces this
/// default entirely; the two are never merged.
pub fn default_permissions(role: Role) -> Vec<Permission> {
    match role {
        Role::Super => vec![
            Permission::All,
            Permission::SuperAdmin,
            Permission::SystemConfig,
            Permission::UserManagement,
            Permission::DataExport,
            Permission::ApiAccess,
            Permission::AuditLogs,
        ],
        Role::Admin => vec![
            Permission::Leads,
            Permission::Quotes,
            Permission::Bookings,
            Permission::Reports,
            Permission::UserManagement,
        ],
        Role::Caller => vec![Permission::Leads, Permission::Quotes, Permission::Bookings],
    }
}

/// Parse incoming permission tags, rejecting anything outside the closed set
pub fn parse_permission_tags(tags: &[String]) -> ItineroResult<Vec<Permission>> {
    let mut permissions = Vec::with_capacity(tags.len());
    for tag in tags {
        let permission = tag
            .parse::<Permission>()
            .map_err(|_| validation_error!(format!("unknown permission tag '{}'", tag), "permissions", "access"))?;
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }
    Ok(permissions)
}

/// Resolve the permission set for a new user
///
/// `explicit` overrides the role default wholesale when present.
pub fn effective_permissions(
    role: Role,
    explicit: Option<&[String]>,
) -> ItineroResult<Vec<Permission>> {
    match explicit {
        Some(tags) => parse_permission_tags(tags),
        None => Ok(default_permissions(role)),
    }
}
