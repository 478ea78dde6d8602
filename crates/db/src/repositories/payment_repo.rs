//! Repository for the `payments` table.

use atelie_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::payment::Payment;

/// Column list for `payments` queries.
const COLUMNS: &str = "id, budget_id, project_id, payment_type, status, amount, \
    gateway_link_id, gateway_event_id, paid_at, due_date, created_at, updated_at";

/// Provides CRUD operations for milestone payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Upsert the payment row for `(budget_id, payment_type)` with a fresh
    /// gateway link.
    ///
    /// The `uq_payments_budget_type` constraint keys the upsert; a re-issued
    /// link replaces the amount, link id, and due date of a still-pending
    /// payment. The `WHERE` on the conflict arm never touches a paid row,
    /// so a settlement racing the link request makes this return `None`
    /// instead of clobbering the settled payment.
    pub async fn upsert_link(
        pool: &PgPool,
        budget_id: DbId,
        payment_type: &str,
        amount: i64,
        gateway_link_id: &str,
        due_date: Timestamp,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (budget_id, payment_type, amount, gateway_link_id, due_date)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_payments_budget_type DO UPDATE SET
                amount = EXCLUDED.amount,
                gateway_link_id = EXCLUDED.gateway_link_id,
                due_date = EXCLUDED.due_date,
                updated_at = NOW()
             WHERE payments.status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(budget_id)
            .bind(payment_type)
            .bind(amount)
            .bind(gateway_link_id)
            .bind(due_date)
            .fetch_optional(pool)
            .await
    }

    /// Find a payment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the payment for a budget and milestone type.
    pub async fn find_by_budget_and_type(
        pool: &PgPool,
        budget_id: DbId,
        payment_type: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE budget_id = $1 AND payment_type = $2"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(budget_id)
            .bind(payment_type)
            .fetch_optional(pool)
            .await
    }

    /// List all payments for a budget.
    pub async fn list_for_budget(
        pool: &PgPool,
        budget_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE budget_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(budget_id)
            .fetch_all(pool)
            .await
    }

    /// Pending payments whose due date has passed.
    pub async fn list_overdue(pool: &PgPool, now: Timestamp) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE status = 'pending' AND due_date IS NOT NULL AND due_date < $1 \
             ORDER BY due_date ASC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }
}
