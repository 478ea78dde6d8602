//! Route definitions for contracts.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::contract;
use crate::state::AppState;

/// Contract routes, merged into `/contracts`.
///
/// The upload route is public: the link mailed to the client carries the
/// contract id, and possession of that link is the only credential.
///
/// ```text
/// POST   /                 create_contract
/// GET    /{id}             get_contract
/// POST   /{id}/upload      upload_signed_document (public)
/// POST   /{id}/confirm     confirm_contract
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(contract::create_contract))
        .route("/{id}", get(contract::get_contract))
        .route("/{id}/upload", post(contract::upload_signed_document))
        .route("/{id}/confirm", post(contract::confirm_contract))
}
