//! Route definitions for the client directory.

use axum::routing::get;
use axum::Router;

use crate::handlers::client;
use crate::state::AppState;

/// ```text
/// GET    /         list_clients
/// GET    /{id}     get_client
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(client::list_clients))
        .route("/{id}", get(client::get_client))
}
