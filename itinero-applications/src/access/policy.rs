//! Role hierarchy policy decisions
//!
//! The rules here are the contract the rest of the system is built on:
//!
//! - `super` manages any user; `admin` manages exactly the callers it
//!   created; `caller` manages no one.
//! - No actor ever deletes its own account.
//! - An actor may always set its own password; anyone else's requires
//!   manageability.

use itinero_core::{Role, User};

/// Outcome of a role-creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// Whether the actor may create user accounts at all
pub fn can_create_users(actor: Role) -> bool {
    actor.is_admin_tier()
}

/// Which role the actor may hand out when creating a user
///
/// Supers mint admins and callers but never other supers; the only super
/// account comes from the unauthenticated bootstrap path. Admins mint
/// callers only.
pub fn role_creation_policy(actor: Role, requested: Role) -> PolicyDecision {
    let allowed = match actor {
        Role::Super => matches!(requested, Role::Admin | Role::Caller),
        Role::Admin => requested == Role::Caller,
        Role::Caller => false,
    };

    if allowed {
        PolicyDecision::Allow
    } else {
        PolicyDecision::Deny
    }
}

/// Whether the actor may view/modify the target user
///
/// Admins are creator-scoped: they manage the callers whose `created_by`
/// points at them, nothing else.
pub fn can_manage_user(actor: &User, target: &User) -> bool {
    match actor.role {
        Role::Super => true,
        Role::Admin => target.role == Role::Caller && target.created_by == Some(actor.id),
        Role::Caller => false,
    }
}

/// Whether the actor may delete the target user
///
/// Self-deletion is denied unconditionally, independent of role.
pub fn can_delete_user(actor: &User, target: &User) -> bool {
    if actor.id == target.id {
        return false;
    }
    can_manage_user(actor, target)
}

/// Whether the actor may set the target user's password
///
/// Changing one's own password is always allowed.
pub fn can_change_password(actor: &User, target: &User) -> bool {
    actor.id == target.id || can_manage_user(actor, target)
}
