//! Domain-level error taxonomy.
//!
//! Handlers map these onto HTTP statuses in the API crate's `AppError`.

use crate::types::DbId;

/// A domain-level error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input failed validation (missing/invalid field).
    #[error("{0}")]
    Validation(String),

    /// A transition was attempted from the wrong state, a token was
    /// replayed, or a uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// An external collaborator (payment gateway, mail relay) failed.
    #[error("{0}")]
    External(String),

    /// Anything that should never happen.
    #[error("{0}")]
    Internal(String),
}
