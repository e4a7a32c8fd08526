//! Route definitions for the Itinero web server

use crate::{auth, handlers, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/bootstrap", post(auth::handlers::bootstrap))
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/refresh", post(auth::handlers::refresh_token))
        .route("/auth/me", get(auth::handlers::get_current_user))
        .route("/auth/password", post(auth::handlers::change_password))
        .route("/auth/logout", post(auth::handlers::logout))
        // User management
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )
        .route("/users/{id}/password", put(handlers::users::set_password))
        .route("/users/{id}/active", put(handlers::users::set_active))
        // Leads
        .route(
            "/leads",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route(
            "/leads/{id}",
            get(handlers::leads::get_lead).delete(handlers::leads::delete_lead),
        )
        .route("/leads/{id}/status", put(handlers::leads::update_lead_status))
        .route("/leads/{id}/assign", put(handlers::leads::assign_lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, WebConfig};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_route() {
        let state = AppState::new(WebConfig::default()).await.unwrap();
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let state = AppState::new(WebConfig::default()).await.unwrap();
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/users")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
