//! Repository for the `budgets` table.

use atelie_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::budget::{Budget, CreateBudget, UpdateBudget};

/// Column list for `budgets` queries.
const COLUMNS: &str = "id, status, client_name, client_email, client_phone, client_document, \
    project_type, complexity, timeline, estimated_min, estimated_max, final_value, \
    approval_token, approval_token_expires, accepted_by, accepted_at, user_approved_at, \
    declined_by, declined_at, decline_reason, project_id, deleted_at, deletion_reason, \
    created_at, updated_at";

/// Provides CRUD operations and status transitions for budgets.
pub struct BudgetRepo;

impl BudgetRepo {
    /// Insert a new intake budget with `status = 'pending'`.
    pub async fn create(pool: &PgPool, input: &CreateBudget) -> Result<Budget, sqlx::Error> {
        let query = format!(
            "INSERT INTO budgets
                (client_name, client_email, client_phone, client_document, project_type,
                 complexity, timeline, estimated_min, estimated_max)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(input.client_name.trim())
            .bind(input.client_email.trim())
            .bind(&input.client_phone)
            .bind(&input.client_document)
            .bind(input.project_type.trim())
            .bind(&input.complexity)
            .bind(&input.timeline)
            .bind(input.estimated_min)
            .bind(input.estimated_max)
            .fetch_one(pool)
            .await
    }

    /// Find a budget by its ID (soft-deleted rows excluded).
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM budgets WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a budget by its live approval token.
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM budgets \
             WHERE approval_token = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Find the budget that spawned a project.
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM budgets \
             WHERE project_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List budgets, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Budget>, sqlx::Error> {
        let filter = if status.is_some() {
            "AND status = $3"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM budgets \
             WHERE deleted_at IS NULL {filter} \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let mut q = sqlx::query_as::<_, Budget>(&query).bind(limit).bind(offset);
        if let Some(status) = status {
            q = q.bind(status);
        }
        q.fetch_all(pool).await
    }

    /// Apply staff edits (final value, estimates) to a budget.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBudget,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!(
            "UPDATE budgets SET
                final_value = COALESCE($2, final_value),
                complexity = COALESCE($3, complexity),
                timeline = COALESCE($4, timeline),
                estimated_min = COALESCE($5, estimated_min),
                estimated_max = COALESCE($6, estimated_max),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .bind(input.final_value)
            .bind(&input.complexity)
            .bind(&input.timeline)
            .bind(input.estimated_min)
            .bind(input.estimated_max)
            .fetch_optional(pool)
            .await
    }

    /// Mark the proposal as sent and install a fresh approval token.
    ///
    /// Overwrites any previous token, invalidating older links.
    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        token: &str,
        expires: Timestamp,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!(
            "UPDATE budgets SET
                status = 'sent',
                approval_token = $2,
                approval_token_expires = $3,
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .bind(token)
            .bind(expires)
            .fetch_optional(pool)
            .await
    }

    /// Record the client's token response and burn the token.
    ///
    /// The `WHERE` clause re-checks the token and the undecided status so a
    /// racing replay loses: it matches zero rows and gets `None` back.
    pub async fn record_token_decision(
        pool: &PgPool,
        id: DbId,
        token: &str,
        accepted: bool,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let status = if accepted { "accepted" } else { "rejected" };
        let query = format!(
            "UPDATE budgets SET
                status = $3,
                approval_token = NULL,
                approval_token_expires = NULL,
                user_approved_at = CASE WHEN $4 THEN NOW() ELSE user_approved_at END,
                updated_at = NOW()
             WHERE id = $1
               AND approval_token = $2
               AND status NOT IN ('accepted', 'rejected')
               AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .bind(token)
            .bind(status)
            .bind(accepted)
            .fetch_optional(pool)
            .await
    }

    /// Record a staff accept/decline, attributable to `user_id`.
    ///
    /// Accepting clears any prior decline fields and vice versa, keeping the
    /// mutual-exclusion invariant: at most one of `accepted_by`/`declined_by`
    /// is ever set.
    pub async fn record_staff_decision(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        accepted: bool,
        decline_reason: Option<&str>,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let query = if accepted {
            format!(
                "UPDATE budgets SET
                    status = 'accepted',
                    accepted_by = $2,
                    accepted_at = NOW(),
                    declined_by = NULL,
                    declined_at = NULL,
                    decline_reason = NULL,
                    updated_at = NOW()
                 WHERE id = $1 AND deleted_at IS NULL
                 RETURNING {COLUMNS}"
            )
        } else {
            format!(
                "UPDATE budgets SET
                    status = 'rejected',
                    declined_by = $2,
                    declined_at = NOW(),
                    decline_reason = $3,
                    accepted_by = NULL,
                    accepted_at = NULL,
                    updated_at = NOW()
                 WHERE id = $1 AND deleted_at IS NULL
                 RETURNING {COLUMNS}"
            )
        };
        let mut q = sqlx::query_as::<_, Budget>(&query).bind(id).bind(user_id);
        if !accepted {
            q = q.bind(decline_reason);
        }
        q.fetch_optional(pool).await
    }

    /// Set the budget status. Callers must have validated the transition
    /// through `atelie_core::budget::validate_transition`.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Budget>, sqlx::Error> {
        let query = format!(
            "UPDATE budgets SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Budget>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a budget with a recorded reason.
    pub async fn soft_delete(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE budgets SET deleted_at = NOW(), deletion_reason = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
