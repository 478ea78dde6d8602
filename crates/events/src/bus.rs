//! In-process publish/subscribe hub.
//!
//! Every business transition announces itself as a [`PlatformEvent`] on
//! the [`EventBus`]; the persistence service, the notification router, and
//! anything else that subscribes each get their own copy. Publishing never
//! blocks and never fails the transition that produced the event.

use atelie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Event names, grouped by lifecycle stage. Dot-separated, entity first.
pub const BUDGET_CREATED: &str = "budget.created";
pub const BUDGET_SENT: &str = "budget.sent";
pub const BUDGET_ACCEPTED: &str = "budget.accepted";
pub const BUDGET_REJECTED: &str = "budget.rejected";
pub const CONTRACT_SIGNED_BY_CLIENT: &str = "contract.signed_by_client";
pub const CONTRACT_CONFIRMED: &str = "contract.confirmed";
pub const PAYMENT_LINK_CREATED: &str = "payment.link_created";
pub const PAYMENT_SETTLED: &str = "payment.settled";
pub const PAYMENT_OVERDUE: &str = "payment.overdue";
pub const PROJECT_CREATED: &str = "project.created";
pub const PROJECT_PROGRESS: &str = "project.progress";
pub const DELIVERY_COMPLETED: &str = "delivery.completed";
pub const DELIVERY_FAILED: &str = "delivery.failed";
pub const RECONCILIATION_FIX: &str = "reconciliation.fix";

/// One domain event: what happened, to which entity, caused by whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// One of the `bus::*` name constants.
    pub event_type: String,
    /// Entity kind the event is about (`"budget"`, `"project"`, ...).
    pub source_entity_type: Option<String>,
    /// Database id of that entity.
    pub source_entity_id: Option<DbId>,
    /// Staff user behind the event; `None` for client-token, webhook, and
    /// reconciliation actors.
    pub actor_user_id: Option<DbId>,
    /// Event-specific details, persisted as JSONB.
    pub payload: serde_json::Value,
    /// When the event was published.
    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Start an event carrying only its type; chain the builders below to
    /// fill in source, actor, and payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::json!({}),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Broadcast buffer size. A subscriber that falls this many events behind
/// observes `RecvError::Lagged` and loses the overwritten ones.
const BUS_CAPACITY: usize = 1024;

/// Cloneable-by-`Arc` fan-out bus over [`broadcast`].
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Hand the event to every current subscriber.
    ///
    /// With zero subscribers the send "fails"; that is fine (nothing
    /// wanted the event) and deliberately not an error.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    /// Open an independent stream of all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_the_full_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(PAYMENT_SETTLED)
                .with_source("budget", 11)
                .with_payload(serde_json::json!({"payment_type": "down_payment"})),
        );

        let event = rx.recv().await.expect("recv");
        assert_eq!(event.event_type, PAYMENT_SETTLED);
        assert_eq!(event.source_entity_type.as_deref(), Some("budget"));
        assert_eq!(event.source_entity_id, Some(11));
        assert_eq!(event.actor_user_id, None);
        assert_eq!(event.payload["payment_type"], "down_payment");
    }

    #[tokio::test]
    async fn every_subscriber_gets_its_own_copy() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(PlatformEvent::new(BUDGET_SENT).with_actor(3));

        assert_eq!(first.recv().await.expect("recv").actor_user_id, Some(3));
        assert_eq!(second.recv().await.expect("recv").actor_user_id, Some(3));
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new(BUDGET_CREATED));

        let mut rx = bus.subscribe();
        bus.publish(PlatformEvent::new(BUDGET_SENT));

        // Only the event published after subscribing arrives.
        assert_eq!(rx.recv().await.expect("recv").event_type, BUDGET_SENT);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_into_the_void_is_fine() {
        EventBus::default().publish(PlatformEvent::new(PROJECT_CREATED));
    }
}
