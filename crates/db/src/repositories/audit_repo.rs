//! Repository for the append-only `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for `audit_logs` queries.
const COLUMNS: &str = "id, actor_user_id, action, entity_type, entity_id, details, created_at";

/// Provides append and query operations for the audit trail.
pub struct AuditRepo;

impl AuditRepo {
    /// Append an audit entry, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (actor_user_id, action, entity_type, entity_id, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.actor_user_id)
            .bind(&input.action)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Query audit entries with optional filters, newest first.
    pub async fn query(
        pool: &PgPool,
        filters: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE ($1::BIGINT IS NULL OR actor_user_id = $1) \
               AND ($2::TEXT IS NULL OR action = $2) \
               AND ($3::TEXT IS NULL OR entity_type = $3) \
               AND ($4::BIGINT IS NULL OR entity_id = $4) \
             ORDER BY created_at DESC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(filters.actor_user_id)
            .bind(&filters.action)
            .bind(&filters.entity_type)
            .bind(filters.entity_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
