//! API integration tests covering the user hierarchy and lead isolation
//! over the full HTTP surface (in-memory backend).

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use itinero_web::{create_app, AppState, WebConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let state = AppState::new(WebConfig::default()).await.unwrap();
    create_app(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Bootstrap the super user and return its access token
async fn bootstrap(app: &Router) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/bootstrap",
        None,
        Some(json!({
            "name": "Root",
            "email": "root@agency.test",
            "password": "rootpass"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

/// Create a user as `token` and log the new account in, returning
/// (user id, access token)
async fn create_and_login(
    app: &Router,
    token: &str,
    email: &str,
    role: &str,
) -> (i64, String) {
    let (status, body) = request(
        app,
        "POST",
        "/api/users",
        Some(token),
        Some(json!({
            "name": email,
            "email": email,
            "password": "password",
            "role": role
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create {} failed: {}", role, body);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (id, body["access_token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn bootstrap_is_single_use() {
    let app = test_app().await;

    let _token = bootstrap(&app).await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/bootstrap",
        None,
        Some(json!({
            "name": "Another",
            "email": "other@agency.test",
            "password": "password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;
    bootstrap(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "root@agency.test", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn hierarchy_visibility_end_to_end() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    let (admin_id, admin_token) =
        create_and_login(&app, &super_token, "admin@agency.test", "admin").await;
    let (caller_id, caller_token) =
        create_and_login(&app, &admin_token, "caller@agency.test", "caller").await;
    assert_eq!(admin_id, 2);
    assert_eq!(caller_id, 3);

    // admin may not create a peer admin
    let (status, _) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({
            "name": "Peer",
            "email": "peer@agency.test",
            "password": "password",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // super sees all users, self-inclusive, in creation order
    let (status, body) = request(&app, "GET", "/api/users", Some(&super_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // admin sees exactly the caller it created
    let (status, body) = request(&app, "GET", "/api/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3]);

    // caller sees nobody
    let (status, body) = request(&app, "GET", "/api/users", Some(&caller_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    // self-delete is forbidden, independent of role
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/users/{}", caller_id),
        Some(&caller_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = request(&app, "DELETE", "/api/users/1", Some(&super_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admin may delete its own caller
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/users/{}", caller_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    create_and_login(&app, &super_token, "agent@agency.test", "caller").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/users",
        Some(&super_token),
        Some(json!({
            "name": "Duplicate",
            "email": "agent@agency.test",
            "password": "password",
            "role": "caller"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // storage unchanged: still exactly [super, caller]
    let (_, body) = request(&app, "GET", "/api/users", Some(&super_token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn lead_isolation_over_http() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    let (_, admin_token) =
        create_and_login(&app, &super_token, "admin@agency.test", "admin").await;
    let (caller_a_id, caller_a_token) =
        create_and_login(&app, &admin_token, "a@agency.test", "caller").await;
    let (_, caller_b_token) =
        create_and_login(&app, &admin_token, "b@agency.test", "sales").await;

    // each caller creates a lead; the admin creates an unassigned one
    let (status, body) = request(
        &app,
        "POST",
        "/api/leads",
        Some(&caller_a_token),
        Some(json!({ "name": "Bali honeymoon", "destination": "Bali" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lead_a = body["id"].as_i64().unwrap();
    assert_eq!(body["assigned_to"].as_i64(), Some(caller_a_id));

    request(
        &app,
        "POST",
        "/api/leads",
        Some(&caller_b_token),
        Some(json!({ "name": "Alps ski trip", "destination": "Zermatt" })),
    )
    .await;
    request(
        &app,
        "POST",
        "/api/leads",
        Some(&admin_token),
        Some(json!({ "name": "Morocco tour", "destination": "Marrakesh" })),
    )
    .await;

    // caller A sees only its own lead, for any filter combination
    let (status, body) = request(&app, "GET", "/api/leads", Some(&caller_a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = request(
        &app,
        "GET",
        "/api/leads?search=BALI&status=new",
        Some(&caller_a_token),
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = request(
        &app,
        "GET",
        "/api/leads?search=zermatt",
        Some(&caller_a_token),
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    // admin sees everything
    let (_, body) = request(&app, "GET", "/api/leads", Some(&admin_token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    // foreign lead access is forbidden for the other caller
    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/leads/{}", lead_a),
        Some(&caller_b_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // callers may not delete leads at all
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/leads/{}", lead_a),
        Some(&caller_a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admin reassigns and the lead moves between scopes
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/leads/{}/assign", lead_a),
        Some(&admin_token),
        Some(json!({ "assigned_to": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // still visible to caller A as its creator
    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/leads/{}", lead_a),
        Some(&caller_a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_returns_role_derived_capabilities() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    let (status, body) = request(&app, "GET", "/api/auth/me", Some(&super_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "super");
    assert_eq!(body["capabilities"]["is_super_user"], true);
    assert_eq!(body["capabilities"]["can_view_audit_logs"], true);

    let (_, admin_token) =
        create_and_login(&app, &super_token, "admin@agency.test", "admin").await;
    let (_, body) = request(&app, "GET", "/api/auth/me", Some(&admin_token), None).await;
    assert_eq!(body["capabilities"]["is_super_user"], false);
    assert_eq!(body["capabilities"]["can_manage_users"], true);
    assert_eq!(body["capabilities"]["can_view_audit_logs"], false);
}

#[tokio::test]
async fn deactivated_users_lose_access() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    let (caller_id, caller_token) =
        create_and_login(&app, &super_token, "caller@agency.test", "caller").await;

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/active", caller_id),
        Some(&super_token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // the still-valid token no longer authenticates
    let (status, _) = request(&app, "GET", "/api/auth/me", Some(&caller_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // and a fresh login is rejected too
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "caller@agency.test", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_rules_over_http() {
    let app = test_app().await;
    let super_token = bootstrap(&app).await;

    let (_, admin_token) =
        create_and_login(&app, &super_token, "admin@agency.test", "admin").await;
    let (caller_id, _) =
        create_and_login(&app, &admin_token, "caller@agency.test", "caller").await;

    // own password change requires the current one
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/password",
        Some(&admin_token),
        Some(json!({ "current_password": "wrong", "new_password": "newpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/password",
        Some(&admin_token),
        Some(json!({ "current_password": "password", "new_password": "newpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // manager resets a manageable user's password
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/password", caller_id),
        Some(&admin_token),
        Some(json!({ "new_password": "rotated-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "caller@agency.test", "password": "rotated-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // the caller cannot reset the admin's password
    let (_, caller_login) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "caller@agency.test", "password": "rotated-pass" })),
    )
    .await;
    let caller_token = caller_login["access_token"].as_str().unwrap();
    let (status, _) = request(
        &app,
        "PUT",
        "/api/users/2/password",
        Some(caller_token),
        Some(json!({ "new_password": "hijacked-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
