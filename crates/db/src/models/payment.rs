//! Payment entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub budget_id: DbId,
    pub project_id: Option<DbId>,
    pub payment_type: String,
    pub status: String,
    pub amount: i64,
    pub gateway_link_id: Option<String>,
    pub gateway_event_id: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Response payload for a generated payment link.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentLinkResponse {
    pub payment: Payment,
    /// Hosted checkout URL; `None` when the payment was already settled and
    /// no new link was issued.
    pub checkout_url: Option<String>,
}
