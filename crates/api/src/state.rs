use std::sync::Arc;

use atelie_events::delivery::email::EmailDelivery;
use atelie_events::EventBus;
use atelie_gateway::PaymentGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: atelie_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Payment gateway client; `None` when no API key is configured.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    /// SMTP mailer for client-facing emails; `None` when unconfigured.
    pub mailer: Option<Arc<EmailDelivery>>,
}
