//! Evaluation entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `evaluations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Evaluation {
    pub id: DbId,
    pub project_id: DbId,
    pub evaluator_id: DbId,
    pub target_id: DbId,
    pub kind: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for submitting an evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvaluation {
    pub target_id: DbId,
    pub kind: String,
    pub rating: i32,
    pub comment: Option<String>,
}
