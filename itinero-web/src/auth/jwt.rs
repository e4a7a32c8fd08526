//! JWT authentication implementation based on Axum official examples
//!
//! Stateless token-in/claims-out verification: every entry point re-verifies
//! its bearer token, and nothing is stored server-side.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use itinero_core::{Role, User};
use itinero_applications::AuthContext;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// JWT signing keys - initialized from environment variable
static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "itinero-default-secret-change-in-production".to_string());
    Keys::new(secret.as_bytes())
});

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// JWT Claims structure
///
/// Carries exactly the identity asserted at issuance: user id and role.
/// Permission sets and capability flags are always re-derived server-side.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i64,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl Claims {
    /// Create new access token claims
    pub fn new_access_token(user_id: i64, role: Role) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(1); // Access token expires in 1 hour

        Self {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            token_type: TokenType::Access,
        }
    }

    /// Create new refresh token claims
    pub fn new_refresh_token(user_id: i64, role: Role) -> Self {
        let now = Utc::now();
        let exp = now + Duration::days(30); // Refresh token expires in 30 days

        Self {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            token_type: TokenType::Refresh,
        }
    }

    /// Convert access-token claims to an actor context
    pub fn to_context(&self) -> Result<AuthContext, AuthError> {
        if self.token_type != TokenType::Access {
            return Err(AuthError::InvalidTokenType);
        }
        Ok(AuthContext::new(self.sub, self.role))
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// JWT token pair (access + refresh)
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: 3600, // 1 hour in seconds
        }
    }
}

/// JWT authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token type")]
    InvalidTokenType,
    #[error("Missing authorization header")]
    MissingAuthHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_creation_failed",
                "Failed to create authentication token",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or malformed token",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Token has expired",
            ),
            AuthError::InvalidTokenType => (
                StatusCode::UNAUTHORIZED,
                "invalid_token_type",
                "Invalid token type for this operation",
            ),
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "missing_auth_header",
                "Authorization header is required",
            ),
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// JWT token utilities
pub struct JwtService;

impl JwtService {
    /// Generate access token
    pub fn generate_access_token(user: &User) -> Result<String, AuthError> {
        let claims = Claims::new_access_token(user.id, user.role);
        encode(&Header::default(), &claims, &KEYS.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::TokenCreation
        })
    }

    /// Generate refresh token
    pub fn generate_refresh_token(user: &User) -> Result<String, AuthError> {
        let claims = Claims::new_refresh_token(user.id, user.role);
        encode(&Header::default(), &claims, &KEYS.encoding).map_err(|e| {
            warn!("Failed to encode refresh token: {}", e);
            AuthError::TokenCreation
        })
    }

    /// Generate token pair
    pub fn generate_token_pair(user: &User) -> Result<TokenPair, AuthError> {
        let access_token = Self::generate_access_token(user)?;
        let refresh_token = Self::generate_refresh_token(user)?;

        Ok(TokenPair::new(access_token, refresh_token))
    }

    /// Verify and decode token
    pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &KEYS.decoding, &Validation::default()).map_err(|e| {
                debug!("Token verification failed: {}", e);
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

/// FromRequestParts implementation for Claims (JWT extraction)
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let auth_header = parts
            .headers
            .get("authorization")
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        // Parse Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        // Verify and decode the token
        JwtService::verify_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinero_core::Permission;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            name: "Token User".to_string(),
            email: format!("user{}@agency.test", id),
            password_hash: "opaque".to_string(),
            role,
            permissions: vec![Permission::Leads],
            is_active: true,
            created_by: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn access_tokens_round_trip() {
        let token = JwtService::generate_access_token(&user(7, Role::Admin)).unwrap();
        let claims = JwtService::verify_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.token_type, TokenType::Access);

        let context = claims.to_context().unwrap();
        assert_eq!(context.user_id, 7);
        assert!(context.is_admin_tier());
    }

    #[test]
    fn refresh_tokens_do_not_authenticate_requests() {
        let token = JwtService::generate_refresh_token(&user(7, Role::Caller)).unwrap();
        let claims = JwtService::verify_token(&token).unwrap();
        assert!(matches!(
            claims.to_context(),
            Err(AuthError::InvalidTokenType)
        ));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(matches!(
            JwtService::verify_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
