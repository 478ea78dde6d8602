//! Drift detection queries for the reconciliation job.
//!
//! A "drifted" budget has a paid payment whose dependent state is missing
//! or behind: budget status not advanced, project never created, or a
//! back-reference left NULL. Each hit is healed by re-running the same
//! idempotent settlement operation that the webhook path uses.

use sqlx::{FromRow, PgPool};

use atelie_core::types::DbId;

/// A paid payment whose dependent state needs re-application.
#[derive(Debug, Clone, FromRow)]
pub struct DriftedSettlement {
    pub budget_id: DbId,
    pub payment_id: DbId,
    pub payment_type: String,
    pub gateway_event_id: Option<String>,
}

/// Provides drift-detection scans.
pub struct ReconciliationRepo;

impl ReconciliationRepo {
    /// Find paid payments with inconsistent dependent state.
    ///
    /// Covers the three drift classes the old manual fix scripts repaired:
    /// - paid down payment, budget still before `down_payment_paid`;
    /// - paid final payment, budget still before `final_payment_paid`;
    /// - paid payment on a budget with no project, or with a project the
    ///   payment row does not reference back.
    pub async fn find_drifted(pool: &PgPool) -> Result<Vec<DriftedSettlement>, sqlx::Error> {
        sqlx::query_as::<_, DriftedSettlement>(
            "SELECT p.budget_id, p.id AS payment_id, p.payment_type, p.gateway_event_id \
             FROM payments p \
             JOIN budgets b ON b.id = p.budget_id \
             WHERE p.status = 'paid' \
               AND b.deleted_at IS NULL \
               AND b.status <> 'rejected' \
               AND ( \
                 (p.payment_type = 'down_payment' \
                    AND b.status IN ('pending', 'sent', 'accepted', 'contract_signed')) \
                 OR (p.payment_type = 'final_payment' \
                    AND b.status IN ('pending', 'sent', 'accepted', 'contract_signed', \
                                     'down_payment_paid')) \
                 OR b.project_id IS NULL \
                 OR p.project_id IS NULL \
               ) \
             ORDER BY p.paid_at ASC",
        )
        .fetch_all(pool)
        .await
    }
}
