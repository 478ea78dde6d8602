//! Hosted-checkout client for the payment gateway.
//!
//! [`StripeGateway`] talks to the Stripe-shaped REST API (form-encoded
//! requests, bearer auth) to create checkout sessions. The
//! [`PaymentGateway`] trait exists so handlers and background jobs can run
//! against [`MockGateway`] in tests without network access.

use std::sync::Mutex;

use async_trait::async_trait;
use atelie_core::types::DbId;
use serde::Deserialize;

/// Error type for gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Gateway API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The webhook signature did not verify.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The webhook payload could not be decoded.
    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),
}

/// Metadata attached to every payment link; echoed back in the webhook and
/// used to route the settlement.
#[derive(Debug, Clone)]
pub struct LinkMetadata {
    pub budget_id: DbId,
    pub payment_type: String,
}

/// A hosted payment page created by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub url: String,
}

/// Configuration for the live gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Secret API key (bearer auth).
    pub secret_key: String,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// API base URL; overridable for tests and sandboxes.
    pub base_url: String,
    /// Checkout currency (default `brl`).
    pub currency: String,
}

/// Default gateway API base URL.
const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Default checkout currency.
const DEFAULT_CURRENCY: &str = "brl";

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `STRIPE_SECRET_KEY` is not set, signalling that
    /// payment links cannot be issued in this deployment.
    ///
    /// | Variable                | Required | Default                  |
    /// |-------------------------|----------|--------------------------|
    /// | `STRIPE_SECRET_KEY`     | yes      | —                        |
    /// | `STRIPE_WEBHOOK_SECRET` | no       | empty (verification off) |
    /// | `STRIPE_BASE_URL`       | no       | `https://api.stripe.com` |
    /// | `STRIPE_CURRENCY`       | no       | `brl`                    |
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY").ok()?;
        Some(Self {
            secret_key,
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            base_url: std::env::var("STRIPE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            currency: std::env::var("STRIPE_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
        })
    }
}

/// Creates hosted payment pages.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment page for the given amount and metadata.
    async fn create_payment_link(
        &self,
        amount_cents: i64,
        description: &str,
        metadata: &LinkMetadata,
    ) -> Result<PaymentLink, GatewayError>;
}

/// Live client for the Stripe-shaped API.
pub struct StripeGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

/// Error body shape returned by the gateway API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    /// Create a client with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The webhook shared secret, for signature verification.
    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_link(
        &self,
        amount_cents: i64,
        description: &str,
        metadata: &LinkMetadata,
    ) -> Result<PaymentLink, GatewayError> {
        let url = format!("{}/v1/checkout/sessions", self.config.base_url);
        let budget_id = metadata.budget_id.to_string();
        let amount = amount_cents.to_string();

        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &self.config.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][price_data][product_data][name]", description),
            ("metadata[budget_id]", &budget_id),
            ("metadata[payment_type]", &metadata.payment_type),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or(ApiErrorBody { error: None });
            let message = body
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown gateway error".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let link: PaymentLink = response.json().await?;
        tracing::info!(
            link_id = %link.id,
            budget_id = metadata.budget_id,
            payment_type = %metadata.payment_type,
            "Payment link created"
        );
        Ok(link)
    }
}

/// In-memory gateway for tests: records every request and returns a
/// deterministic link.
#[derive(Default)]
pub struct MockGateway {
    /// `(amount_cents, description, budget_id, payment_type)` per call.
    pub calls: Mutex<Vec<(i64, String, DbId, String)>>,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_link(
        &self,
        amount_cents: i64,
        description: &str,
        metadata: &LinkMetadata,
    ) -> Result<PaymentLink, GatewayError> {
        self.calls.lock().expect("mock gateway lock poisoned").push((
            amount_cents,
            description.to_string(),
            metadata.budget_id,
            metadata.payment_type.clone(),
        ));
        Ok(PaymentLink {
            id: format!("plink_mock_{}_{}", metadata.budget_id, metadata.payment_type),
            url: format!(
                "https://checkout.test/pay/{}/{}",
                metadata.budget_id, metadata.payment_type
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_records_calls() {
        let gateway = MockGateway::default();
        let metadata = LinkMetadata {
            budget_id: 7,
            payment_type: "down_payment".to_string(),
        };

        let link = gateway
            .create_payment_link(250_000, "Down payment", &metadata)
            .await
            .expect("mock link");

        assert!(link.id.contains("plink_mock_7"));
        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 250_000);
        assert_eq!(calls[0].3, "down_payment");
    }

    #[test]
    fn from_env_returns_none_without_secret_key() {
        std::env::remove_var("STRIPE_SECRET_KEY");
        assert!(GatewayConfig::from_env().is_none());
    }
}
