//! Repository for the `evaluations` table.

use atelie_core::types::DbId;
use sqlx::PgPool;

use crate::models::evaluation::Evaluation;

/// Column list for `evaluations` queries.
const COLUMNS: &str =
    "id, project_id, evaluator_id, target_id, kind, rating, comment, created_at";

/// Provides CRUD operations for evaluations.
pub struct EvaluationRepo;

impl EvaluationRepo {
    /// Insert an evaluation. The `uq_evaluations_triple` constraint rejects
    /// a second rating for the same (project, evaluator, target, kind) with
    /// a conflict — "already evaluated".
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        evaluator_id: DbId,
        target_id: DbId,
        kind: &str,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Evaluation, sqlx::Error> {
        let query = format!(
            "INSERT INTO evaluations (project_id, evaluator_id, target_id, kind, rating, comment)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(project_id)
            .bind(evaluator_id)
            .bind(target_id)
            .bind(kind)
            .bind(rating)
            .bind(comment)
            .fetch_one(pool)
            .await
    }

    /// List all evaluations for a project, newest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Evaluation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM evaluations \
             WHERE project_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
