//! Webhook event parsing and signature verification.
//!
//! The gateway reports completed checkouts with a JSON body shaped like
//!
//! ```json
//! {
//!   "id": "evt_...",
//!   "type": "checkout.session.completed",
//!   "data": { "object": {
//!     "id": "cs_...",
//!     "metadata": { "budget_id": "42", "payment_type": "down_payment" }
//!   } }
//! }
//! ```
//!
//! and signs the raw body with HMAC-SHA256, sent hex-encoded in the
//! `X-Gateway-Signature` header.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use atelie_core::types::DbId;

use crate::client::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Event type emitted when a hosted checkout completes.
pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A decoded "checkout completed" event.
#[derive(Debug, Clone)]
pub struct CheckoutEvent {
    /// Gateway event id; the settlement dedupe key.
    pub event_id: String,
    /// Checkout session / payment reference.
    pub payment_reference: String,
    pub budget_id: DbId,
    pub payment_type: String,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawData {
    object: RawObject,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    id: String,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    budget_id: Option<String>,
    payment_type: Option<String>,
}

/// Verify the webhook signature over the raw body.
///
/// An empty `secret` disables verification (unconfigured deployments);
/// otherwise the hex signature must be the HMAC-SHA256 of `payload`.
/// Comparison happens inside the `hmac` crate and is constant-time.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> Result<(), GatewayError> {
    if secret.is_empty() {
        return Ok(());
    }

    let signature = decode_hex(signature_hex).ok_or(GatewayError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::InvalidSignature)?;
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| GatewayError::InvalidSignature)
}

/// Compute the hex signature for a payload. Used by tests and by the
/// outbound webhook delivery channel's counterpart.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    format!("{:x}", mac.finalize().into_bytes())
}

/// Decode a "checkout completed" event body.
///
/// Returns `Ok(None)` for event types this system does not consume, so the
/// handler can acknowledge them without doing any work.
pub fn parse_event(payload: &[u8]) -> Result<Option<CheckoutEvent>, GatewayError> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| GatewayError::MalformedEvent(e.to_string()))?;

    if raw.event_type != EVENT_CHECKOUT_COMPLETED {
        return Ok(None);
    }

    let budget_id: DbId = raw
        .data
        .object
        .metadata
        .budget_id
        .as_deref()
        .ok_or_else(|| GatewayError::MalformedEvent("missing metadata.budget_id".to_string()))?
        .parse()
        .map_err(|_| GatewayError::MalformedEvent("metadata.budget_id is not an id".to_string()))?;

    let payment_type = raw
        .data
        .object
        .metadata
        .payment_type
        .ok_or_else(|| GatewayError::MalformedEvent("missing metadata.payment_type".to_string()))?;

    Ok(Some(CheckoutEvent {
        event_id: raw.id,
        payment_reference: raw.data.object.id,
        budget_id,
        payment_type,
    }))
}

/// Decode a hex string into bytes; `None` on odd length or non-hex chars.
fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_body(event_id: &str, budget_id: &str) -> Vec<u8> {
        serde_json::json!({
            "id": event_id,
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "metadata": { "budget_id": budget_id, "payment_type": "down_payment" }
            } }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn parses_completed_checkout() {
        let event = parse_event(&completed_body("evt_1", "42"))
            .expect("parse")
            .expect("consumed event");
        assert_eq!(event.event_id, "evt_1");
        assert_eq!(event.budget_id, 42);
        assert_eq!(event.payment_type, "down_payment");
        assert_eq!(event.payment_reference, "cs_test_1");
    }

    #[test]
    fn ignores_other_event_types() {
        let body = serde_json::json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": { "object": { "id": "in_1" } }
        })
        .to_string();
        assert!(parse_event(body.as_bytes()).expect("parse").is_none());
    }

    #[test]
    fn missing_metadata_is_malformed() {
        let body = serde_json::json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_2", "metadata": {} } }
        })
        .to_string();
        assert!(parse_event(body.as_bytes()).is_err());
    }

    #[test]
    fn non_numeric_budget_id_is_malformed() {
        let body = serde_json::json!({
            "id": "evt_4",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_3",
                "metadata": { "budget_id": "abc", "payment_type": "down_payment" }
            } }
        })
        .to_string();
        assert!(parse_event(body.as_bytes()).is_err());
    }

    #[test]
    fn signature_round_trip() {
        let payload = b"payload bytes";
        let signature = sign("whsec_test", payload);
        assert!(verify_signature("whsec_test", payload, &signature).is_ok());
    }

    #[test]
    fn wrong_signature_rejected() {
        let payload = b"payload bytes";
        let signature = sign("whsec_other", payload);
        assert!(verify_signature("whsec_test", payload, &signature).is_err());
    }

    #[test]
    fn tampered_payload_rejected() {
        let signature = sign("whsec_test", b"original");
        assert!(verify_signature("whsec_test", b"tampered", &signature).is_err());
    }

    #[test]
    fn garbage_signature_rejected() {
        assert!(verify_signature("whsec_test", b"x", "zz-not-hex").is_err());
        assert!(verify_signature("whsec_test", b"x", "abc").is_err());
    }

    #[test]
    fn empty_secret_skips_verification() {
        assert!(verify_signature("", b"anything", "whatever").is_ok());
    }
}
