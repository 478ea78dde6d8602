//! Repository for the `contracts` table.

use atelie_core::types::DbId;
use sqlx::PgPool;

use crate::models::contract::Contract;

/// Column list for `contracts` queries.
const COLUMNS: &str = "id, budget_id, status, document_path, signed_by_client_at, confirmed, \
    signed_at, project_id, created_at, updated_at";

/// Provides CRUD operations and status transitions for contracts.
pub struct ContractRepo;

impl ContractRepo {
    /// Draft a contract for a budget. The `uq_contracts_budget` constraint
    /// rejects a second contract for the same budget with a conflict.
    pub async fn create(pool: &PgPool, budget_id: DbId) -> Result<Contract, sqlx::Error> {
        let query = format!(
            "INSERT INTO contracts (budget_id) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contract>(&query)
            .bind(budget_id)
            .fetch_one(pool)
            .await
    }

    /// Find a contract by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Contract>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contracts WHERE id = $1");
        sqlx::query_as::<_, Contract>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record the client's signed upload.
    ///
    /// The `WHERE status = 'draft'` guard makes a repeated upload match zero
    /// rows, so the first `document_path` is never overwritten.
    pub async fn record_client_signature(
        pool: &PgPool,
        id: DbId,
        document_path: &str,
    ) -> Result<Option<Contract>, sqlx::Error> {
        let query = format!(
            "UPDATE contracts SET
                status = 'signed_by_client',
                document_path = $2,
                signed_by_client_at = NOW(),
                updated_at = NOW()
             WHERE id = $1 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contract>(&query)
            .bind(id)
            .bind(document_path)
            .fetch_optional(pool)
            .await
    }

    /// Staff confirmation: status → `confirmed`, stamped `signed_at`.
    pub async fn confirm(pool: &PgPool, id: DbId) -> Result<Option<Contract>, sqlx::Error> {
        let query = format!(
            "UPDATE contracts SET
                status = 'confirmed',
                confirmed = TRUE,
                signed_at = NOW(),
                updated_at = NOW()
             WHERE id = $1 AND status <> 'confirmed'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contract>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
