//! Route definitions for inbound webhooks.

use axum::routing::post;
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// ```text
/// POST   /gateway    gateway_webhook (signature-verified)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", post(payment::gateway_webhook))
}
