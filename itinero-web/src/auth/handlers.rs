//! Authentication handlers: bootstrap, login, token refresh, self-service

use super::{jwt::TokenType, Actor, JwtService, TokenPair};
use crate::handlers::ApiError;
use crate::AppState;
use axum::{extract::State, response::Json};
use itinero_applications::{BootstrapRequest, Capabilities};
use itinero_core::PublicUser;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Password change request (own account)
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Login/bootstrap response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// First-run bootstrap endpoint
///
/// Creates the initial super user while the system is empty. Closed with
/// 409 as soon as any user exists.
pub async fn bootstrap(
    State(state): State<AppState>,
    Json(request): Json<BootstrapRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.directory.bootstrap(request).await?;
    let tokens = JwtService::generate_token_pair(&user)?;

    info!(user_id = user.id, "Bootstrap completed");
    Ok(Json(AuthResponse {
        user: user.to_public(),
        tokens,
    }))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .directory
        .authenticate(&request.email, &request.password)
        .await?;
    let tokens = JwtService::generate_token_pair(&user)?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(AuthResponse {
        user: user.to_public(),
        tokens,
    }))
}

/// Token refresh endpoint
///
/// The refresh token only names an account; the current record decides
/// whether new tokens are handed out.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let claims = JwtService::verify_token(&request.refresh_token)?;
    if claims.token_type != TokenType::Refresh {
        return Err(super::AuthError::InvalidTokenType.into());
    }

    let user = state
        .load_actor(&itinero_applications::AuthContext::new(claims.sub, claims.role))
        .await?;

    let tokens = JwtService::generate_token_pair(&user)?;
    info!(user_id = user.id, "Token refreshed");
    Ok(Json(tokens))
}

/// Current user endpoint
///
/// Returns the account record plus capability flags derived from role.
pub async fn get_current_user(
    State(state): State<AppState>,
    Actor(context): Actor,
) -> Result<Json<Value>, ApiError> {
    let user = state.load_actor(&context).await?;

    Ok(Json(json!({
        "user": user.to_public(),
        "capabilities": Capabilities::for_role(user.role),
    })))
}

/// Change the authenticated user's own password
pub async fn change_password(
    State(state): State<AppState>,
    Actor(context): Actor,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = state.load_actor(&context).await?;

    state
        .directory
        .change_own_password(&actor, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(json!({
        "message": "Password changed successfully",
    })))
}

/// Logout endpoint (client-side token invalidation)
///
/// Tokens are stateless, so there is nothing to revoke server-side; clients
/// discard their tokens after calling this endpoint.
pub async fn logout(Actor(context): Actor) -> Json<Value> {
    info!(user_id = context.user_id, "User logged out");

    Json(json!({
        "message": "Logged out successfully",
        "user_id": context.user_id,
    }))
}
