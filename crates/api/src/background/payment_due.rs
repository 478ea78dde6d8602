//! Overdue-payment sweep.
//!
//! A payment link has a 5-day due date but the gateway callback has no
//! enforced timeout, so a payment can sit `pending` forever. This job
//! flags payments that crossed their due date during the last interval so
//! staff get exactly one notification per overdue payment.

use std::sync::Arc;
use std::time::Duration;

use atelie_db::repositories::PaymentRepo;
use atelie_db::DbPool;
use atelie_events::bus::{self, PlatformEvent};
use atelie_events::EventBus;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Default sweep interval: 1 hour.
const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Run the overdue-payment loop until `cancel` is triggered.
pub async fn run(pool: DbPool, event_bus: Arc<EventBus>, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("PAYMENT_DUE_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    tracing::info!(interval_secs, "Overdue-payment job started");

    let window = chrono::Duration::seconds(interval_secs as i64);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Overdue-payment job stopping");
                break;
            }
            _ = interval.tick() => {
                match PaymentRepo::list_overdue(&pool, Utc::now()).await {
                    Ok(overdue) => {
                        for payment in overdue {
                            // Only announce payments that became overdue since
                            // the previous tick, so staff are not re-notified
                            // every hour.
                            let newly_overdue = payment
                                .due_date
                                .is_some_and(|due| due > Utc::now() - window);
                            if !newly_overdue {
                                continue;
                            }
                            tracing::warn!(
                                payment_id = payment.id,
                                budget_id = payment.budget_id,
                                "Payment is overdue"
                            );
                            event_bus.publish(
                                PlatformEvent::new(bus::PAYMENT_OVERDUE)
                                    .with_source("payment", payment.id)
                                    .with_payload(serde_json::json!({
                                        "budget_id": payment.budget_id,
                                        "payment_type": payment.payment_type,
                                        "due_date": payment.due_date,
                                    })),
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Overdue-payment sweep failed");
                    }
                }
            }
        }
    }
}
