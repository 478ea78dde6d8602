//! Shared fixture for API integration tests.
//!
//! Builds the full application router (same middleware stack as
//! production) against a per-test database provided by `#[sqlx::test]`,
//! with a mock payment gateway and no SMTP.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;

use atelie_api::auth::jwt::{issue_access_token, JwtConfig};
use atelie_api::auth::password::hash_password;
use atelie_api::config::ServerConfig;
use atelie_api::router::build_app_router;
use atelie_api::state::AppState;
use atelie_core::roles::{PROJECT_MANAGER_DESIGNATION, ROLE_ADMIN, ROLE_TEAM_MEMBER};
use atelie_core::types::DbId;
use atelie_db::models::user::User;
use atelie_db::repositories::UserRepo;
use atelie_gateway::{MockGateway, PaymentGateway};

/// Build a test `ServerConfig` with safe defaults.
///
/// Webhook signature verification is disabled (empty secret) so tests can
/// post unsigned gateway events; the signature path is covered by the
/// gateway crate's unit tests.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        public_base_url: "http://localhost:5173".to_string(),
        upload_dir: std::env::temp_dir()
            .join("atelie-test-uploads")
            .to_string_lossy()
            .into_owned(),
        gateway_webhook_secret: String::new(),
        push_webhook_url: None,
        push_webhook_secret: String::new(),
        jwt: test_jwt_config(),
    }
}

/// JWT configuration with a fixed test secret.
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-long-enough".to_string(),
        access_token_expiry_mins: 15,
        refresh_token_expiry_days: 7,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a [`MockGateway`].
pub fn build_test_app(pool: PgPool) -> Router {
    let (app, _) = build_test_app_with_gateway(pool);
    app
}

/// Like [`build_test_app`], also returning the mock gateway for call
/// inspection.
pub fn build_test_app_with_gateway(pool: PgPool) -> (Router, Arc<MockGateway>) {
    let config = test_config();
    let gateway = Arc::new(MockGateway::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(atelie_events::EventBus::default()),
        gateway: Some(gateway.clone() as Arc<dyn PaymentGateway>),
        mailer: None,
    };

    (build_app_router(state, &config), gateway)
}

/// Insert an admin account and return it with a valid bearer token.
pub async fn seed_admin(pool: &PgPool) -> (User, String) {
    seed_user(pool, "admin@atelie.test", ROLE_ADMIN, None).await
}

/// Insert a team member with the project-manager designation and return it
/// with a valid bearer token.
pub async fn seed_project_manager(pool: &PgPool) -> (User, String) {
    seed_user(
        pool,
        "pm@atelie.test",
        ROLE_TEAM_MEMBER,
        Some(PROJECT_MANAGER_DESIGNATION),
    )
    .await
}

/// Insert a plain team member (no designation) and return it with a valid
/// bearer token.
pub async fn seed_team_member(pool: &PgPool) -> (User, String) {
    seed_user(pool, "member@atelie.test", ROLE_TEAM_MEMBER, None).await
}

async fn seed_user(
    pool: &PgPool,
    email: &str,
    role: &str,
    team_role: Option<&str>,
) -> (User, String) {
    let password_hash = hash_password("test-password-123").expect("hashing");
    let user = UserRepo::create(pool, email, &password_hash, "Test User", role, team_role)
        .await
        .expect("seed user");
    let token = issue_access_token(user.id, role, team_role, &test_jwt_config())
        .expect("token generation");
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Perform a GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    request(app, "GET", uri, None, None).await
}

/// Perform an authenticated GET request.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request(app, "GET", uri, None, Some(token)).await
}

/// Perform a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    request(app, "POST", uri, Some(body), None).await
}

/// Perform an authenticated POST request with a JSON body.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, "POST", uri, Some(body), Some(token)).await
}

/// Perform an authenticated POST request with an empty body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request(app, "POST", uri, None, Some(token)).await
}

/// Perform a PUT request with a JSON body.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    request(app, "PUT", uri, Some(body), None).await
}

/// Perform an authenticated PUT request with a JSON body.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, "PUT", uri, Some(body), Some(token)).await
}

/// Perform an authenticated DELETE request with a JSON body.
pub async fn request_delete(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, "DELETE", uri, Some(body), Some(token)).await
}

async fn request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    app.oneshot(request).await.expect("response")
}

/// Perform a multipart file upload.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    field_name: &str,
    filename: &str,
    bytes: &[u8],
) -> Response<Body> {
    let boundary = "----atelie-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");
    app.oneshot(request).await.expect("response")
}

/// Decode a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("valid JSON body")
}

/// Post an unsigned gateway "checkout completed" event.
pub async fn post_settlement_event(
    app: Router,
    event_id: &str,
    budget_id: DbId,
    payment_type: &str,
) -> Response<Body> {
    let body = serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": format!("cs_{event_id}"),
            "metadata": {
                "budget_id": budget_id.to_string(),
                "payment_type": payment_type,
            }
        } }
    });
    post_json(app, "/api/v1/webhooks/gateway", body).await
}

/// Assert a response status, consuming and printing the body on mismatch.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}
