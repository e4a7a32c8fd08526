//! HTTP handlers and the API error envelope

pub mod leads;
pub mod users;

use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use itinero_core::ItineroError;
use serde_json::json;

/// Domain error wrapper carrying the HTTP mapping
///
/// Every handler returns `Result<_, ApiError>`; the taxonomy in
/// `itinero-core` maps onto status codes here and nowhere else.
#[derive(Debug)]
pub struct ApiError(pub ItineroError);

impl From<ItineroError> for ApiError {
    fn from(err: ItineroError) -> Self {
        ApiError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let inner = match err {
            AuthError::TokenCreation => ItineroError::Internal {
                message: "failed to create authentication token".to_string(),
                source: None,
                context: itinero_core::ErrorContext::new("auth"),
            },
            other => itinero_core::unauthenticated_error!(other, "auth"),
        };
        ApiError(inner)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();

        let (status, error_code) = match &self.0 {
            ItineroError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ItineroError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            ItineroError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ItineroError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            ItineroError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        // Internal details stay in the logs; clients get the classification
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let mut body = json!({
            "error": error_code,
            "message": message,
        });
        if let ItineroError::Validation { field: Some(field), .. } = &self.0 {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "itinero-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
