//! Server configuration.

use crate::auth::jwt::JwtConfig;

/// Runtime settings for the HTTP server, read once at startup.
///
/// Defaults suit local development; production deployments override via
/// environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Bind port (`PORT`, default `3000`).
    pub port: u16,
    /// Dashboard origins allowed by CORS (`CORS_ORIGINS`, comma-separated).
    pub cors_origins: Vec<String>,
    /// Per-request timeout (`REQUEST_TIMEOUT_SECS`, default 30).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background services
    /// (`SHUTDOWN_TIMEOUT_SECS`, default 30).
    pub shutdown_timeout_secs: u64,
    /// Base of the client-facing links we mail out: approval pages and
    /// contract uploads (`PUBLIC_BASE_URL`).
    pub public_base_url: String,
    /// Where uploaded contract PDFs land (`UPLOAD_DIR`).
    pub upload_dir: String,
    /// Secret for verifying inbound gateway webhooks
    /// (`STRIPE_WEBHOOK_SECRET`). Empty disables verification, which is
    /// acceptable only in development.
    pub gateway_webhook_secret: String,
    /// Dashboard push endpoint (`PUSH_WEBHOOK_URL`); unset disables push.
    pub push_webhook_url: Option<String>,
    /// Secret for signing outbound push bodies (`PUSH_WEBHOOK_SECRET`).
    pub push_webhook_secret: String,
    /// Access/refresh token settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read everything from the environment.
    pub fn from_env() -> Self {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parsed("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_parsed("SHUTDOWN_TIMEOUT_SECS", 30),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
            upload_dir: env_or("UPLOAD_DIR", "./uploads"),
            gateway_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            push_webhook_url: std::env::var("PUSH_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            push_webhook_secret: std::env::var("PUSH_WEBHOOK_SECRET").unwrap_or_default(),
            jwt: JwtConfig::from_env(),
        }
    }

    /// The public approval-page URL for a token.
    pub fn approval_url(&self, token: &str) -> String {
        format!("{}/approval/{token}", self.public_base_url)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} has an invalid value: '{raw}'")),
        Err(_) => default,
    }
}
