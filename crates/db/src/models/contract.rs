//! Contract entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `contracts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contract {
    pub id: DbId,
    pub budget_id: DbId,
    pub status: String,
    pub document_path: Option<String>,
    pub signed_by_client_at: Option<Timestamp>,
    pub confirmed: bool,
    pub signed_at: Option<Timestamp>,
    pub project_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for drafting a contract for a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContract {
    pub budget_id: DbId,
}
