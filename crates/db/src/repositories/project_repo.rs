//! Repository for the `projects` table.

use atelie_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::Project;

/// Column list for `projects` queries.
const COLUMNS: &str = "id, client_id, client_name, name, status, progress, budget_value, \
    completed_at, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let filter = if status.is_some() {
            "WHERE status = $3"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM projects {filter} \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let mut q = sqlx::query_as::<_, Project>(&query).bind(limit).bind(offset);
        if let Some(status) = status {
            q = q.bind(status);
        }
        q.fetch_all(pool).await
    }

    /// Set a progress milestone and its matching status.
    pub async fn set_progress(
        pool: &PgPool,
        id: DbId,
        progress: i32,
        status: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET progress = $2, status = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(progress)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
