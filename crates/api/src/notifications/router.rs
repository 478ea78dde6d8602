//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] subscribes to the platform event bus and turns
//! each event into inbox rows for the staff, plus an optional signed push
//! to the dashboard's webhook endpoint. Delivery is fire-and-forget: a
//! failed push never affects the transition that produced the event.

use atelie_db::repositories::{NotificationRepo, UserRepo};
use atelie_db::DbPool;
use atelie_events::delivery::webhook::WebhookDelivery;
use atelie_events::{bus, PlatformEvent};
use tokio::sync::broadcast;

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    push: Option<(WebhookDelivery, String)>,
}

impl NotificationRouter {
    /// Create a new router. `push` carries the outbound webhook URL and
    /// signing secret when the dashboard push channel is configured.
    pub fn new(pool: DbPool, push_url: Option<String>, push_secret: String) -> Self {
        let push = push_url.map(|url| (WebhookDelivery::new(push_secret), url));
        Self { pool, push }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](atelie_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event: inbox rows for all active staff, then the
    /// optional dashboard push.
    async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        let Some((title, message, category)) = describe(event) else {
            return Ok(());
        };

        let staff = UserRepo::list_active_staff_ids(&self.pool).await?;
        for user_id in staff {
            // The acting user does not need to be told what they just did.
            if event.actor_user_id == Some(user_id) {
                continue;
            }
            NotificationRepo::create(
                &self.pool,
                user_id,
                &title,
                &message,
                category,
                &event.payload,
            )
            .await?;
        }

        if let Some((delivery, url)) = &self.push {
            if let Err(e) = delivery.deliver(url, event).await {
                tracing::warn!(error = %e, event_type = %event.event_type, "Dashboard push failed");
            }
        }

        Ok(())
    }
}

/// Map an event to `(title, message, category)`; `None` means the event
/// produces no staff notification.
fn describe(event: &PlatformEvent) -> Option<(String, String, &'static str)> {
    let entity_id = event.source_entity_id.unwrap_or_default();
    match event.event_type.as_str() {
        bus::BUDGET_CREATED => Some((
            "Novo pedido de orçamento".to_string(),
            format!("Orçamento #{entity_id} recebido pelo formulário do site"),
            "budget",
        )),
        bus::BUDGET_ACCEPTED => Some((
            "Orçamento aceito".to_string(),
            format!("Orçamento #{entity_id} foi aceito"),
            "budget",
        )),
        bus::BUDGET_REJECTED => Some((
            "Orçamento recusado".to_string(),
            format!("Orçamento #{entity_id} foi recusado"),
            "budget",
        )),
        bus::CONTRACT_SIGNED_BY_CLIENT => Some((
            "Contrato assinado".to_string(),
            format!("O cliente enviou o contrato assinado (#{entity_id})"),
            "contract",
        )),
        bus::PAYMENT_SETTLED => Some((
            "Pagamento confirmado".to_string(),
            format!("Pagamento do orçamento #{entity_id} foi confirmado"),
            "payment",
        )),
        bus::PAYMENT_OVERDUE => Some((
            "Pagamento atrasado".to_string(),
            format!("Pagamento #{entity_id} passou do vencimento"),
            "payment",
        )),
        bus::PROJECT_CREATED => Some((
            "Projeto criado".to_string(),
            format!("Projeto #{entity_id} criado após o pagamento de entrada"),
            "project",
        )),
        bus::DELIVERY_FAILED => Some((
            "Entrega falhou".to_string(),
            format!("A entrega do projeto #{entity_id} falhou e aguarda reagendamento"),
            "delivery",
        )),
        bus::RECONCILIATION_FIX => Some((
            "Correção automática".to_string(),
            format!("A verificação periódica corrigiu o estado do orçamento #{entity_id}"),
            "system",
        )),
        // Routine events (sent, link created, progress, delivery ok) stay
        // out of the inbox; they are still persisted and pushed.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noisy_events_produce_no_inbox_rows() {
        assert!(describe(&PlatformEvent::new(bus::BUDGET_SENT)).is_none());
        assert!(describe(&PlatformEvent::new(bus::PROJECT_PROGRESS)).is_none());
        assert!(describe(&PlatformEvent::new(bus::DELIVERY_COMPLETED)).is_none());
    }

    #[test]
    fn settlement_and_intake_notify_staff() {
        let event = PlatformEvent::new(bus::BUDGET_CREATED).with_source("budget", 9);
        let (title, message, category) = describe(&event).expect("describes");
        assert!(!title.is_empty());
        assert!(message.contains("#9"));
        assert_eq!(category, "budget");

        assert!(describe(&PlatformEvent::new(bus::PAYMENT_SETTLED)).is_some());
        assert!(describe(&PlatformEvent::new(bus::RECONCILIATION_FIX)).is_some());
    }
}
