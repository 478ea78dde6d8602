//! Payment-gateway client and webhook plumbing.
//!
//! The gateway is an external collaborator with a two-call surface:
//! [`PaymentGateway::create_payment_link`] returns a hosted checkout URL,
//! and the gateway later reports completion through a signed webhook that
//! [`webhook::parse_event`] decodes and [`webhook::verify_signature`]
//! authenticates.

pub mod client;
pub mod webhook;

pub use client::{GatewayConfig, GatewayError, LinkMetadata, MockGateway, PaymentGateway, PaymentLink, StripeGateway};
pub use webhook::{parse_event, verify_signature, CheckoutEvent};
