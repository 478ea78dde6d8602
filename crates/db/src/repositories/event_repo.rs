//! Repository for the durable `events` table.

use atelie_core::types::{DbId, Timestamp};
use sqlx::PgPool;

/// Provides insert operations for the event persistence service.
pub struct EventRepo;

impl EventRepo {
    /// Durably record a platform event, returning the generated ID.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        source_entity_type: Option<&str>,
        source_entity_id: Option<DbId>,
        actor_user_id: Option<DbId>,
        payload: &serde_json::Value,
        occurred_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events \
                (event_type, source_entity_type, source_entity_id, actor_user_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(source_entity_type)
        .bind(source_entity_id)
        .bind(actor_user_id)
        .bind(payload)
        .bind(occurred_at)
        .fetch_one(pool)
        .await
    }
}
