//! Signed push channel to the dashboard.
//!
//! [`WebhookDelivery`] POSTs selected [`PlatformEvent`]s as JSON to the
//! configured push endpoint, authenticating the body with an HMAC-SHA256
//! hex digest in `X-Atelie-Signature`. A failed push is retried on a 1s /
//! 2s / 4s backoff and then abandoned; push is a convenience channel and
//! the inbox row is the durable copy.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::bus::PlatformEvent;

type HmacSha256 = Hmac<Sha256>;

/// Backoff schedule between attempts; one final attempt follows the last
/// sleep, so the schedule means four tries in total.
const BACKOFF_SECS: [u64; 3] = [1, 2, 4];

/// Per-attempt HTTP timeout.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the body digest.
pub const SIGNATURE_HEADER: &str = "X-Atelie-Signature";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// Pushes events to an external endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    secret: String,
}

impl WebhookDelivery {
    /// Build the push client. An empty `secret` means unsigned requests;
    /// deployments that want verification set `PUSH_WEBHOOK_SECRET`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(ATTEMPT_TIMEOUT)
                .build()
                .expect("Failed to build reqwest HTTP client"),
            secret: secret.into(),
        }
    }

    /// Push one event, retrying on the backoff schedule.
    pub async fn deliver(&self, url: &str, event: &PlatformEvent) -> Result<(), WebhookError> {
        let body = serde_json::json!({
            "event_type": event.event_type,
            "source_entity_type": event.source_entity_type,
            "source_entity_id": event.source_entity_id,
            "payload": event.payload,
            "timestamp": event.timestamp,
        })
        .to_string();

        for (attempt, backoff) in BACKOFF_SECS.iter().enumerate() {
            let Err(e) = self.post_signed(url, &body).await else {
                return Ok(());
            };
            tracing::warn!(attempt = attempt + 1, url, error = %e, "Push attempt failed");
            tokio::time::sleep(Duration::from_secs(*backoff)).await;
        }

        self.post_signed(url, &body).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "Push abandoned after retries");
        })
    }

    async fn post_signed(&self, url: &str, body: &str) -> Result<(), WebhookError> {
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body.to_string());
        if !self.secret.is_empty() {
            request = request.header(SIGNATURE_HEADER, self.signature(body.as_bytes()));
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(WebhookError::HttpStatus(status.as_u16())),
        }
    }

    /// Hex HMAC-SHA256 of the request body.
    fn signature(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(body);
        format!("{:x}", mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_are_deterministic_hex() {
        let push = WebhookDelivery::new("push-secret");
        let first = push.signature(b"{\"event_type\":\"budget.sent\"}");
        let second = push.signature(b"{\"event_type\":\"budget.sent\"}");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn body_changes_change_the_signature() {
        let push = WebhookDelivery::new("push-secret");
        assert_ne!(push.signature(b"one"), push.signature(b"two"));
    }

    #[test]
    fn secret_changes_change_the_signature() {
        let a = WebhookDelivery::new("secret-a").signature(b"body");
        let b = WebhookDelivery::new("secret-b").signature(b"body");
        assert_ne!(a, b);
    }

    #[test]
    fn status_error_names_the_code() {
        assert_eq!(
            WebhookError::HttpStatus(503).to_string(),
            "Webhook returned HTTP 503"
        );
    }
}
