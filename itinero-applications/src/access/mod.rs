//! Access Control Authority
//!
//! Role hierarchy decisions for the three-tier user model
//! (`super` > `admin` > `caller`). Every function here is a pure,
//! synchronous function of already-loaded records: no I/O, no shared state.

pub mod capabilities;
pub mod context;
pub mod permissions;
pub mod policy;

pub use capabilities::Capabilities;
pub use context::AuthContext;
pub use permissions::{default_permissions, effective_permissions, parse_permission_tags};
pub use policy::{
    can_change_password, can_create_users, can_delete_user, can_manage_user,
    role_creation_policy, PolicyDecision,
};
