//! Periodic settlement reconciliation.
//!
//! Scans for paid payments whose dependent state is missing or behind
//! (budget status not advanced, project never created, back-references
//! NULL) and heals each one by re-running the idempotent settlement
//! transaction. Every correction is audited and announced on the event
//! bus. This job replaces the manual one-off repair scripts that used to
//! patch these rows by hand.

use std::sync::Arc;
use std::time::Duration;

use atelie_core::payment::PaymentType;
use atelie_db::models::audit::CreateAuditLog;
use atelie_db::repositories::{AuditRepo, ReconciliationRepo, SettlementRepo};
use atelie_db::DbPool;
use atelie_events::bus::{self, PlatformEvent};
use atelie_events::EventBus;
use tokio_util::sync::CancellationToken;

/// Default sweep interval: 15 minutes.
const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(pool: DbPool, event_bus: Arc<EventBus>, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("RECONCILE_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    tracing::info!(interval_secs, "Reconciliation job started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = sweep(&pool, &event_bus).await {
                    tracing::error!(error = %e, "Reconciliation sweep failed");
                }
            }
        }
    }
}

/// One sweep: find drifted settlements and re-apply each.
async fn sweep(pool: &DbPool, event_bus: &EventBus) -> Result<(), sqlx::Error> {
    let drifted = ReconciliationRepo::find_drifted(pool).await?;
    if drifted.is_empty() {
        tracing::debug!("Reconciliation: no drift found");
        return Ok(());
    }

    tracing::warn!(count = drifted.len(), "Reconciliation: drifted settlements found");

    for row in drifted {
        let payment_type = match PaymentType::parse(&row.payment_type) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(payment_id = row.payment_id, error = %e, "Reconciliation: unparseable payment type");
                continue;
            }
        };

        // The stored gateway event id keeps the dedupe key stable; rows
        // settled before that column existed get a synthetic one.
        let event_id = row
            .gateway_event_id
            .clone()
            .unwrap_or_else(|| format!("reconcile-{}", row.payment_id));

        match SettlementRepo::settle(pool, row.budget_id, payment_type, &event_id).await {
            Ok(Some(outcome)) => {
                tracing::warn!(
                    budget_id = row.budget_id,
                    payment_id = row.payment_id,
                    project_created = outcome.project_created,
                    budget_status = %outcome.budget_status,
                    "Reconciliation: settlement re-applied"
                );
                let entry = CreateAuditLog {
                    actor_user_id: None,
                    action: "reconciliation.fix".to_string(),
                    entity_type: Some("budget".to_string()),
                    entity_id: Some(row.budget_id),
                    details: Some(serde_json::json!({
                        "payment_id": row.payment_id,
                        "payment_type": row.payment_type,
                        "project_created": outcome.project_created,
                        "budget_status": outcome.budget_status,
                    })),
                };
                if let Err(e) = AuditRepo::create(pool, &entry).await {
                    tracing::error!(error = %e, "Reconciliation: audit write failed");
                }
                event_bus.publish(
                    PlatformEvent::new(bus::RECONCILIATION_FIX)
                        .with_source("budget", row.budget_id)
                        .with_payload(serde_json::json!({ "payment_id": row.payment_id })),
                );
            }
            Ok(None) => {
                tracing::error!(
                    budget_id = row.budget_id,
                    "Reconciliation: budget vanished mid-sweep"
                );
            }
            Err(e) => {
                tracing::error!(
                    budget_id = row.budget_id,
                    error = %e,
                    "Reconciliation: settlement re-application failed"
                );
            }
        }
    }

    Ok(())
}
