//! Outbound mail channel.
//!
//! Everything client-facing (proposal links, payment links and receipts,
//! progress updates) goes out as plain-text SMTP mail through
//! [`EmailDelivery`]. Deployments without `SMTP_HOST` simply run without a
//! mailer; callers treat the channel as optional.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Why a message could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Email build error: {0}")]
    Build(String),
}

const SMTP_PORT_DEFAULT: u16 = 587;
const FROM_DEFAULT: &str = "noreply@atelie.local";

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Read SMTP settings from the environment.
    ///
    /// `SMTP_HOST` decides whether mail exists at all: absent means
    /// `None`, and the caller runs without a mailer. `SMTP_PORT` (587,
    /// STARTTLS), `SMTP_FROM`, `SMTP_USER`, and `SMTP_PASSWORD` refine the
    /// relay when it does.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let smtp_port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(SMTP_PORT_DEFAULT);
        let from_address = std::env::var("SMTP_FROM").unwrap_or_else(|_| FROM_DEFAULT.into());

        Some(Self {
            smtp_host,
            smtp_port,
            from_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Plain-text mail sender over a STARTTLS relay.
///
/// The transport is built once at startup; `lettre` pools connections
/// underneath it.
pub struct EmailDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailDelivery {
    /// Build the SMTP transport for `config`.
    pub fn connect(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address,
        })
    }

    /// Send one plain-text message.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        tracing::info!(to, subject, "Email delivered to relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_smtp_host_means_no_mailer() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn bad_recipient_surfaces_as_address_error() {
        let err: Result<lettre::Address, _> = "definitely not an address".parse();
        let err = EmailError::Address(err.unwrap_err());
        assert!(err.to_string().starts_with("Email address parse error"));
    }

    #[test]
    fn build_error_keeps_its_message() {
        assert_eq!(
            EmailError::Build("empty body".into()).to_string(),
            "Email build error: empty body"
        );
    }
}
