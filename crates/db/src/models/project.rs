//! Project entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub client_id: Option<DbId>,
    pub client_name: String,
    pub name: String,
    pub status: String,
    pub progress: i32,
    pub budget_value: i64,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for a progress milestone update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRequest {
    pub progress: i32,
}

/// Request body for a delivery confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfirmation {
    pub success: bool,
    /// Required when `success` is `false`.
    pub failure_reason: Option<String>,
}
