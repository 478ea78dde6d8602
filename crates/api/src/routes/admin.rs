//! Route definitions for authentication and admin surfaces.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin, audit, auth};
use crate::state::AppState;

/// Authentication routes, merged into `/auth`.
///
/// ```text
/// POST   /login      login
/// POST   /refresh    refresh
/// POST   /logout     logout
/// ```
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}

/// Admin routes, merged into `/admin`.
///
/// ```text
/// GET    /users          list_users
/// POST   /users          create_user
/// PUT    /users/{id}     update_user
/// DELETE /users/{id}     deactivate_user
/// GET    /audit          query_audit_log
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::deactivate_user),
        )
        .route("/audit", get(audit::query_audit_log))
}
