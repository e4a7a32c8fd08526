//! User management handlers
//!
//! Every operation loads the actor's live record first, then routes the
//! decision through the access policy before any storage mutation.

use super::ApiError;
use crate::auth::Actor;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use itinero_applications::CreateUserRequest;
use itinero_core::PublicUser;
use serde::Deserialize;
use serde_json::{json, Value};

/// Activation toggle request
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Managed password reset request
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

/// List the users the actor may manage, in creation order
pub async fn list_users(
    State(state): State<AppState>,
    Actor(context): Actor,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let users = state.directory.manageable_users(&actor).await?;

    Ok(Json(users.iter().map(|u| u.to_public()).collect()))
}

/// Create a user on behalf of the actor
pub async fn create_user(
    State(state): State<AppState>,
    Actor(context): Actor,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let user = state.directory.create_user(&actor, request).await?;

    Ok(Json(user.to_public()))
}

/// Fetch a single user the actor may see
pub async fn get_user(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let actor = state.load_actor(&context).await?;
    let user = state.directory.get_user(&actor, user_id).await?;

    Ok(Json(user.to_public()))
}

/// Set another user's password
pub async fn set_password(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(user_id): Path<i64>,
    Json(request): Json<SetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = state.load_actor(&context).await?;
    state
        .directory
        .set_password(&actor, user_id, &request.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Activate or deactivate a user
pub async fn set_active(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(user_id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = state.load_actor(&context).await?;
    state
        .directory
        .set_active(&actor, user_id, request.is_active)
        .await?;

    Ok(Json(json!({
        "message": "Activation updated",
        "is_active": request.is_active,
    })))
}

/// Delete a user
///
/// Self-deletion is denied unconditionally before any other check.
pub async fn delete_user(
    State(state): State<AppState>,
    Actor(context): Actor,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let actor = state.load_actor(&context).await?;
    state.directory.delete_user(&actor, user_id).await?;

    Ok(Json(json!({ "message": "User deleted" })))
}
