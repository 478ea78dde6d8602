//! Budget entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `budgets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Budget {
    pub id: DbId,
    pub status: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_document: Option<String>,
    pub project_type: String,
    pub complexity: Option<String>,
    pub timeline: Option<String>,
    pub estimated_min: Option<i64>,
    pub estimated_max: Option<i64>,
    pub final_value: i64,
    /// Never serialized: the token is a capability and only ever leaves the
    /// system inside the approval URL sent to the client.
    #[serde(skip_serializing)]
    pub approval_token: Option<String>,
    pub approval_token_expires: Option<Timestamp>,
    pub accepted_by: Option<DbId>,
    pub accepted_at: Option<Timestamp>,
    pub user_approved_at: Option<Timestamp>,
    pub declined_by: Option<DbId>,
    pub declined_at: Option<Timestamp>,
    pub decline_reason: Option<String>,
    pub project_id: Option<DbId>,
    pub deleted_at: Option<Timestamp>,
    pub deletion_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for the public intake form.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudget {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_document: Option<String>,
    pub project_type: String,
    pub complexity: Option<String>,
    pub timeline: Option<String>,
    pub estimated_min: Option<i64>,
    pub estimated_max: Option<i64>,
}

/// DTO for staff edits before the proposal goes out.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBudget {
    pub final_value: Option<i64>,
    pub complexity: Option<String>,
    pub timeline: Option<String>,
    pub estimated_min: Option<i64>,
    pub estimated_max: Option<i64>,
}

/// Request body for a staff decision.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffDecisionRequest {
    /// Required when declining.
    pub reason: Option<String>,
}

/// Request body for the public token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponseRequest {
    /// `"accept"` or `"reject"`.
    pub response: String,
}

/// Request body for soft-deleting a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteBudgetRequest {
    pub reason: String,
}
