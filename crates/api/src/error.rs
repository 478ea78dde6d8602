//! HTTP error mapping.
//!
//! Handlers return [`AppError`]; `IntoResponse` turns each variant into a
//! `{ "error": ..., "code": ... }` JSON body with the matching status.
//! Domain errors ([`CoreError`]) carry their own taxonomy; database and
//! gateway failures are classified here, and anything unexpected
//! collapses to an opaque 500 so internals never leak to the client.

use atelie_core::error::CoreError;
use atelie_gateway::GatewayError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// The catch-all body for failures the client should learn nothing about.
fn opaque_500() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn core_response(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::External(msg) => {
            tracing::error!(error = %msg, "External service error");
            (StatusCode::BAD_GATEWAY, "EXTERNAL_ERROR", msg.clone())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            opaque_500()
        }
    }
}

/// Classify a sqlx failure.
///
/// Unique-constraint violations (Postgres code 23505) on our `uq_`-named
/// constraints are how the schema enforces "one contract per budget",
/// "one payment per milestone", "already evaluated", and token
/// uniqueness; they surface as 409 rather than 500.
fn database_response(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            opaque_500()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            opaque_500()
        }
    }
}

fn gateway_response(err: &GatewayError) -> (StatusCode, &'static str, String) {
    match err {
        GatewayError::InvalidSignature => (
            StatusCode::UNAUTHORIZED,
            "INVALID_SIGNATURE",
            "Webhook signature verification failed".to_string(),
        ),
        GatewayError::MalformedEvent(msg) => (
            StatusCode::BAD_REQUEST,
            "MALFORMED_EVENT",
            format!("Malformed webhook event: {msg}"),
        ),
        other => {
            tracing::error!(error = %other, "Payment gateway error");
            (
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
                "Payment gateway request failed".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => core_response(core),
            AppError::Database(err) => database_response(err),
            AppError::Gateway(err) => gateway_response(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                opaque_500()
            }
        };

        let body = json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}
