//! Authentication and authorization plumbing for the HTTP layer
//!
//! Tokens are verified at every entry point; a valid access token yields an
//! [`Actor`] and nothing else. The actor's full user record is re-loaded
//! from storage before any authorization decision, so stale role or
//! activation state in a token never widens access.

pub mod credentials;
pub mod handlers;
pub mod jwt;

pub use credentials::ArgonCredentials;
pub use jwt::{AuthError, Claims, JwtService, TokenPair};

use axum::{extract::FromRequestParts, http::request::Parts};
use itinero_applications::AuthContext;

/// The authenticated actor extracted from a bearer token
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub AuthContext);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;
        claims.to_context().map(Actor)
    }
}
