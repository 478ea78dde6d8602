//! Atelie event bus and notification delivery infrastructure.
//!
//! Building blocks for the platform-wide event system:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope.
//! - [`EventPersistence`] — background service that durably writes every
//!   event to the `events` table.
//! - [`delivery`] — external delivery channels (email, signed webhook).
//!
//! Delivery is fire-and-forget by contract: a failed email or webhook is
//! logged and dropped, never propagated into the business transition that
//! produced the event.

pub mod bus;
pub mod delivery;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::webhook::WebhookDelivery;
pub use persistence::EventPersistence;
