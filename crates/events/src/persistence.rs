//! Event journal writer.
//!
//! [`EventPersistence`] drains one subscription of the bus into the
//! `events` table so the stream survives restarts and can be queried
//! later. A write failure loses that single event (and is logged); it is
//! never allowed to stall the loop or back-pressure publishers.

use atelie_db::repositories::EventRepo;
use atelie_db::DbPool;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::bus::PlatformEvent;

/// Background task persisting every published event.
pub struct EventPersistence;

impl EventPersistence {
    /// Consume `receiver` until the bus is dropped.
    ///
    /// `Lagged` means this writer fell behind the broadcast buffer and the
    /// overwritten events are gone; that is logged and the loop keeps
    /// going with whatever is still buffered.
    pub async fn run(pool: DbPool, mut receiver: Receiver<PlatformEvent>) {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Event journal fell behind; events dropped");
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Event bus dropped, journal writer exiting");
                    return;
                }
            };

            let written = EventRepo::insert(
                &pool,
                &event.event_type,
                event.source_entity_type.as_deref(),
                event.source_entity_id,
                event.actor_user_id,
                &event.payload,
                event.timestamp,
            )
            .await;

            if let Err(e) = written {
                tracing::error!(error = %e, event_type = %event.event_type, "Event journal write failed");
            }
        }
    }
}
