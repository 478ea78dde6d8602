//! Route definitions for the public approval links.
//!
//! These routes are unauthenticated: the opaque token in the path is the
//! capability.

use axum::routing::get;
use axum::Router;

use crate::handlers::approval;
use crate::state::AppState;

/// ```text
/// GET    /{token}    view_proposal
/// PUT    /{token}    respond
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{token}",
        get(approval::view_proposal).put(approval::respond),
    )
}
