//! Repository for the `clients` table.

use atelie_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::Client;

/// Column list for `clients` queries.
const COLUMNS: &str = "id, document, name, email, phone, created_at, updated_at";

/// Provides lookup-or-create operations for clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Find a client by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a client by normalized document number.
    pub async fn find_by_document(
        pool: &PgPool,
        document: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE document = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(document)
            .fetch_optional(pool)
            .await
    }

    /// List clients, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clients ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
