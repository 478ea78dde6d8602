//! HTTP request handlers, one module per surface.

pub mod admin;
pub mod approval;
pub mod audit;
pub mod auth;
pub mod budget;
pub mod client;
pub mod contract;
pub mod evaluation;
pub mod health;
pub mod notification;
pub mod payment;
pub mod project;
pub mod schedule;

use atelie_db::models::audit::CreateAuditLog;
use atelie_db::repositories::AuditRepo;
use atelie_core::types::DbId;

use crate::state::AppState;

/// Send a client-facing email without blocking or failing the request.
///
/// Email is a side effect outside the transaction boundary of the state
/// change it announces: a delivery failure is logged, never surfaced.
pub(crate) fn spawn_email(state: &AppState, to: String, subject: String, body: String) {
    let Some(mailer) = state.mailer.clone() else {
        tracing::debug!(to, subject, "SMTP not configured, skipping email");
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &body).await {
            tracing::error!(error = %e, to, subject, "Failed to send email");
        }
    });
}

/// Record an audit entry without failing the request on audit errors.
pub(crate) async fn record_audit(
    state: &AppState,
    actor_user_id: Option<DbId>,
    action: &str,
    entity_type: &str,
    entity_id: DbId,
    details: serde_json::Value,
) {
    let entry = CreateAuditLog {
        actor_user_id,
        action: action.to_string(),
        entity_type: Some(entity_type.to_string()),
        entity_id: Some(entity_id),
        details: Some(details),
    };
    if let Err(e) = AuditRepo::create(&state.pool, &entry).await {
        tracing::error!(error = %e, action, "Failed to write audit entry");
    }
}

/// Build a prepared (not auto-sent) WhatsApp deep link for a phone number
/// and message. The operator opens the link and presses send.
pub(crate) fn whatsapp_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let encoded = percent_encode(text);
    format!("https://wa.me/{digits}?text={encoded}")
}

/// Minimal percent-encoding for WhatsApp message text.
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
