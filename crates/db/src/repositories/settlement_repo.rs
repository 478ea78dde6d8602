//! The settlement saga: everything that must happen when the payment
//! gateway reports a completed checkout.
//!
//! The whole group of writes — mark the payment paid, advance the budget,
//! find-or-create the client, create the project, backfill the foreign
//! keys, promote the contract — runs inside ONE transaction with the
//! budget row locked `FOR UPDATE`. Concurrent or duplicate webhook
//! deliveries serialize on that lock and each step is guarded so a replay
//! is a no-op. The reconciliation job calls the same operation to heal
//! drift, which is why every step re-checks current state instead of
//! assuming it runs exactly once.

use atelie_core::budget::BudgetStatus;
use atelie_core::document::normalize_document;
use atelie_core::money::{down_payment_amount, final_payment_amount};
use atelie_core::payment::PaymentType;
use atelie_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::budget::Budget;

/// What a settlement run changed. All flags are `false` on a pure replay.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub budget_id: DbId,
    pub payment_id: DbId,
    pub project_id: Option<DbId>,
    /// The payment was already `paid` before this run.
    pub payment_was_already_paid: bool,
    /// This run created the project.
    pub project_created: bool,
    /// The budget status after the run.
    pub budget_status: String,
}

impl SettlementOutcome {
    /// Whether the run changed anything at all.
    pub fn changed(&self) -> bool {
        !self.payment_was_already_paid || self.project_created
    }
}

/// Executes the settlement transaction.
pub struct SettlementRepo;

impl SettlementRepo {
    /// Settle a payment for a budget, idempotently.
    ///
    /// Returns `None` when the budget does not exist (or is soft-deleted);
    /// the webhook handler maps that to 404 so the gateway retries against
    /// operator attention rather than silently dropping money events.
    pub async fn settle(
        pool: &PgPool,
        budget_id: DbId,
        payment_type: PaymentType,
        gateway_event_id: &str,
    ) -> Result<Option<SettlementOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialize concurrent settlement attempts on the budget row.
        let budget: Option<Budget> = sqlx::query_as(
            "SELECT id, status, client_name, client_email, client_phone, client_document, \
                    project_type, complexity, timeline, estimated_min, estimated_max, \
                    final_value, approval_token, approval_token_expires, accepted_by, \
                    accepted_at, user_approved_at, declined_by, declined_at, decline_reason, \
                    project_id, deleted_at, deletion_reason, created_at, updated_at \
             FROM budgets WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(budget_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(budget) = budget else {
            return Ok(None);
        };

        // --- Payment: mark paid (or insert an already-paid row if the link
        // was never recorded, which is exactly the drift the old fix scripts
        // repaired by hand). ---
        let amount = match payment_type {
            PaymentType::DownPayment => down_payment_amount(budget.final_value),
            PaymentType::FinalPayment => final_payment_amount(budget.final_value),
        };

        let existing: Option<(DbId, String)> = sqlx::query_as(
            "SELECT id, status FROM payments \
             WHERE budget_id = $1 AND payment_type = $2 FOR UPDATE",
        )
        .bind(budget_id)
        .bind(payment_type.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let (payment_id, payment_was_already_paid) = match existing {
            Some((id, status)) if status == "paid" => (id, true),
            Some((id, _)) => {
                sqlx::query(
                    "UPDATE payments SET \
                        status = 'paid', paid_at = NOW(), gateway_event_id = $2, \
                        updated_at = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(gateway_event_id)
                .execute(&mut *tx)
                .await?;
                (id, false)
            }
            None => {
                let id: DbId = sqlx::query_scalar(
                    "INSERT INTO payments \
                        (budget_id, payment_type, status, amount, gateway_event_id, paid_at) \
                     VALUES ($1, $2, 'paid', $3, $4, NOW()) \
                     RETURNING id",
                )
                .bind(budget_id)
                .bind(payment_type.as_str())
                .bind(amount)
                .bind(gateway_event_id)
                .fetch_one(&mut *tx)
                .await?;
                (id, false)
            }
        };

        // --- Budget: advance only when the lifecycle has not already
        // recorded this milestone. ---
        let current = BudgetStatus::parse(&budget.status)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        let next = match payment_type {
            PaymentType::DownPayment if current.is_before_down_payment() => {
                Some(BudgetStatus::DownPaymentPaid)
            }
            PaymentType::FinalPayment if current.is_before_final_payment() => {
                Some(BudgetStatus::FinalPaymentPaid)
            }
            _ => None,
        };
        let budget_status = match next {
            Some(status) => {
                sqlx::query("UPDATE budgets SET status = $2, updated_at = NOW() WHERE id = $1")
                    .bind(budget_id)
                    .bind(status.as_str())
                    .execute(&mut *tx)
                    .await?;
                status.as_str().to_string()
            }
            None => budget.status.clone(),
        };

        // --- Project: create once, then keep the back-references complete. ---
        let mut project_created = false;
        let project_id = match budget.project_id {
            Some(id) => Some(id),
            None => {
                let client_id = find_or_create_client(&mut tx, &budget).await?;
                let id: DbId = sqlx::query_scalar(
                    "INSERT INTO projects \
                        (client_id, client_name, name, status, progress, budget_value) \
                     VALUES ($1, $2, $3, 'planning', 0, $4) \
                     RETURNING id",
                )
                .bind(client_id)
                .bind(&budget.client_name)
                .bind(&budget.project_type)
                .bind(budget.final_value)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("UPDATE budgets SET project_id = $2, updated_at = NOW() WHERE id = $1")
                    .bind(budget_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                project_created = true;
                Some(id)
            }
        };

        if let Some(project_id) = project_id {
            // Backfill the payment's project link (NULL until now for links
            // generated before the project existed).
            sqlx::query(
                "UPDATE payments SET project_id = $2, updated_at = NOW() \
                 WHERE id = $1 AND project_id IS NULL",
            )
            .bind(payment_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

            // A contract drafted for this budget becomes part of the project
            // record and counts as signed once money moved.
            sqlx::query(
                "UPDATE contracts SET \
                    project_id = $2, \
                    status = 'confirmed', \
                    confirmed = TRUE, \
                    signed_at = COALESCE(signed_at, NOW()), \
                    updated_at = NOW() \
                 WHERE budget_id = $1 AND status <> 'confirmed'",
            )
            .bind(budget_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

            // Ensure the link is present even on contracts confirmed earlier.
            sqlx::query(
                "UPDATE contracts SET project_id = $2, updated_at = NOW() \
                 WHERE budget_id = $1 AND project_id IS NULL",
            )
            .bind(budget_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(SettlementOutcome {
            budget_id,
            payment_id,
            project_id,
            payment_was_already_paid,
            project_created,
            budget_status,
        }))
    }
}

/// Find an existing client for the budget's contact data or create one.
///
/// Lookup is by normalized document number when the intake captured one,
/// falling back to email. Existing records are reused as-is: identity
/// fields are first-write-wins and never overwritten here.
async fn find_or_create_client(
    tx: &mut PgConnection,
    budget: &Budget,
) -> Result<DbId, sqlx::Error> {
    let document = budget
        .client_document
        .as_deref()
        .map(normalize_document)
        .filter(|d| !d.is_empty());

    if let Some(ref document) = document {
        let found: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM clients WHERE document = $1")
                .bind(document)
                .fetch_optional(&mut *tx)
                .await?;
        if let Some(id) = found {
            return Ok(id);
        }
    } else {
        let found: Option<DbId> = sqlx::query_scalar("SELECT id FROM clients WHERE email = $1")
            .bind(&budget.client_email)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(id) = found {
            return Ok(id);
        }
    }

    sqlx::query_scalar(
        "INSERT INTO clients (document, name, email, phone) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(document)
    .bind(&budget.client_name)
    .bind(&budget.client_email)
    .bind(&budget.client_phone)
    .fetch_one(&mut *tx)
    .await
}
