//! User directory service
//!
//! Orchestrates user lifecycle operations: bootstrap of the first super
//! user, creation by higher-role actors, password changes, deactivation, and
//! deletion. Every operation checks policy before touching storage, so a
//! denial never leaves a partial mutation behind.

use crate::access::{
    can_change_password, can_create_users, can_delete_user, can_manage_user,
    effective_permissions, role_creation_policy,
};
use crate::credentials::Credentials;
use crate::storage::{NewUserRecord, UserStore};
use itinero_core::{
    conflict_error, forbidden_error, not_found_error, validation_error, ItineroResult, Role, User,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// Request to create the first super user on an empty system
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to create a user on behalf of an authenticated actor
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Explicit permission tags; replaces the role default entirely
    pub permissions: Option<Vec<String>>,
}

/// User lifecycle operations over a storage backend
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    credentials: Arc<dyn Credentials>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>, credentials: Arc<dyn Credentials>) -> Self {
        Self { store, credentials }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Create the first super user
    ///
    /// Only valid while the user table is empty; afterwards the path is
    /// closed with `Conflict`.
    pub async fn bootstrap(&self, request: BootstrapRequest) -> ItineroResult<User> {
        if self.store.count().await? > 0 {
            return Err(conflict_error!("super user", "directory"));
        }

        let email = validate_email(&request.email)?;
        validate_name(&request.name)?;
        validate_password(&request.password)?;

        let password_hash = self.credentials.hash_password(&request.password)?;
        let user = self
            .store
            .insert(NewUserRecord {
                name: request.name,
                email,
                password_hash,
                role: Role::Super,
                permissions: effective_permissions(Role::Super, None)?,
                created_by: None,
            })
            .await?;

        info!(user_id = user.id, "Bootstrapped first super user");
        Ok(user)
    }

    /// Create a user on behalf of `actor`
    pub async fn create_user(&self, actor: &User, request: CreateUserRequest) -> ItineroResult<User> {
        if !can_create_users(actor.role) {
            warn!(actor_id = actor.id, "User creation denied: not admin tier");
            return Err(forbidden_error!("not allowed to create users", "directory"));
        }
        if !role_creation_policy(actor.role, request.role).is_allowed() {
            warn!(
                actor_id = actor.id,
                requested_role = %request.role,
                "User creation denied by role policy"
            );
            return Err(forbidden_error!(
                format!("role '{}' may not create '{}' users", actor.role, request.role),
                "directory"
            ));
        }

        let email = validate_email(&request.email)?;
        validate_name(&request.name)?;
        validate_password(&request.password)?;
        let permissions = effective_permissions(request.role, request.permissions.as_deref())?;

        let password_hash = self.credentials.hash_password(&request.password)?;
        let user = self
            .store
            .insert(NewUserRecord {
                name: request.name,
                email,
                password_hash,
                role: request.role,
                permissions,
                created_by: Some(actor.id),
            })
            .await?;

        info!(
            actor_id = actor.id,
            user_id = user.id,
            role = %user.role,
            "Created user"
        );
        Ok(user)
    }

    /// Authenticate by email and password, yielding the user record
    pub async fn authenticate(&self, email: &str, password: &str) -> ItineroResult<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                itinero_core::unauthenticated_error!("invalid email or password", "directory")
            })?;

        if !self.credentials.verify_password(password, &user.password_hash) {
            warn!(user_id = user.id, "Login rejected: bad password");
            return Err(itinero_core::unauthenticated_error!(
                "invalid email or password",
                "directory"
            ));
        }

        Ok(user)
    }

    /// Load a user record by id, failing with `NotFound` when absent
    pub async fn require_user(&self, id: i64) -> ItineroResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error!(format!("user {}", id), "directory"))
    }

    /// Fetch a user the actor is allowed to see (itself or a manageable one)
    pub async fn get_user(&self, actor: &User, target_id: i64) -> ItineroResult<User> {
        let target = self.require_user(target_id).await?;
        if actor.id == target.id || can_manage_user(actor, &target) {
            Ok(target)
        } else {
            Err(forbidden_error!("target user is not manageable", "directory"))
        }
    }

    /// Users the actor may manage, in creation order
    ///
    /// Supers see all users (self-inclusive); admins see the users they
    /// created; callers see nothing.
    pub async fn manageable_users(&self, actor: &User) -> ItineroResult<Vec<User>> {
        match actor.role {
            Role::Super => self.store.list_all().await,
            Role::Admin => self.store.list_created_by(actor.id).await,
            Role::Caller => Ok(Vec::new()),
        }
    }

    /// Change the actor's own password after verifying the current one
    pub async fn change_own_password(
        &self,
        actor: &User,
        current_password: &str,
        new_password: &str,
    ) -> ItineroResult<()> {
        if !self
            .credentials
            .verify_password(current_password, &actor.password_hash)
        {
            return Err(forbidden_error!("current password is incorrect", "directory"));
        }
        validate_password(new_password)?;

        let password_hash = self.credentials.hash_password(new_password)?;
        self.store.update_password(actor.id, &password_hash).await?;
        info!(user_id = actor.id, "Password changed");
        Ok(())
    }

    /// Set another user's password; requires manageability
    pub async fn set_password(
        &self,
        actor: &User,
        target_id: i64,
        new_password: &str,
    ) -> ItineroResult<()> {
        let target = self.require_user(target_id).await?;
        if !can_change_password(actor, &target) {
            return Err(forbidden_error!(
                "not allowed to change this user's password",
                "directory"
            ));
        }
        validate_password(new_password)?;

        let password_hash = self.credentials.hash_password(new_password)?;
        self.store.update_password(target.id, &password_hash).await?;
        info!(
            actor_id = actor.id,
            user_id = target.id,
            "Password set by manager"
        );
        Ok(())
    }

    /// Activate or deactivate a manageable user
    pub async fn set_active(&self, actor: &User, target_id: i64, is_active: bool) -> ItineroResult<()> {
        let target = self.require_user(target_id).await?;
        if !can_manage_user(actor, &target) {
            return Err(forbidden_error!("target user is not manageable", "directory"));
        }

        self.store.update_active(target.id, is_active).await?;
        info!(
            actor_id = actor.id,
            user_id = target.id,
            is_active,
            "Updated user activation"
        );
        Ok(())
    }

    /// Delete a user
    ///
    /// Self-deletion is denied before the target is even loaded; everything
    /// else routes through manageability.
    pub async fn delete_user(&self, actor: &User, target_id: i64) -> ItineroResult<()> {
        if actor.id == target_id {
            return Err(forbidden_error!("accounts may not delete themselves", "directory"));
        }

        let target = self.require_user(target_id).await?;
        if !can_delete_user(actor, &target) {
            return Err(forbidden_error!("target user is not manageable", "directory"));
        }

        self.store.delete(target.id).await?;
        info!(actor_id = actor.id, user_id = target.id, "Deleted user");
        Ok(())
    }
}

fn validate_name(name: &str) -> ItineroResult<()> {
    if name.trim().is_empty() {
        return Err(validation_error!("name must not be empty", "name", "directory"));
    }
    Ok(())
}

/// Normalize and validate an email address; comparison is case-insensitive
/// so addresses are stored lowercased
fn validate_email(email: &str) -> ItineroResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(validation_error!(
            format!("'{}' is not a valid email address", email),
            "email",
            "directory"
        ));
    }
    Ok(email)
}

fn validate_password(password: &str) -> ItineroResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(validation_error!(
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            "password",
            "directory"
        ));
    }
    Ok(())
}
