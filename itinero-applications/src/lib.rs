//! Itinero Applications - Access control authority and application services
//!
//! This crate owns every authorization decision in the system: who may
//! create, view, modify, or delete which users, which permission set a role
//! defaults to, and which leads an actor is allowed to see. Decisions are
//! pure functions of already-loaded records; storage access goes through the
//! trait seams in [`storage`].

pub mod access;
pub mod credentials;
pub mod directory;
pub mod leads;
pub mod storage;

pub use access::{
    can_change_password, can_create_users, can_delete_user, can_manage_user, default_permissions,
    role_creation_policy, AuthContext, Capabilities, PolicyDecision,
};
pub use credentials::Credentials;
pub use directory::{BootstrapRequest, CreateUserRequest, UserDirectory};
pub use leads::{LeadService, NewLeadRequest};
pub use storage::{
    LeadScope, LeadStore, MemoryLeadStore, MemoryUserStore, NewLeadRecord, NewUserRecord,
    UserStore,
};
