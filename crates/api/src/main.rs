use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelie_api::config::ServerConfig;
use atelie_api::router::build_app_router;
use atelie_api::state::AppState;
use atelie_api::{background, notifications};
use atelie_events::delivery::email::{EmailConfig, EmailDelivery};
use atelie_events::{EventBus, EventPersistence};
use atelie_gateway::{GatewayConfig, PaymentGateway, StripeGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelie_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Configuration loaded");

    let pool = connect_database().await;

    let gateway = payment_gateway();
    let mailer = mailer();

    // Everything that listens to the bus gets its own subscription before
    // the first request can publish.
    let event_bus = Arc::new(EventBus::default());
    let journal = tokio::spawn(EventPersistence::run(pool.clone(), event_bus.subscribe()));
    let inbox_router = notifications::NotificationRouter::new(
        pool.clone(),
        config.push_webhook_url.clone(),
        config.push_webhook_secret.clone(),
    );
    let inbox = tokio::spawn(inbox_router.run(event_bus.subscribe()));

    let jobs_cancel = tokio_util::sync::CancellationToken::new();
    let reconciliation = tokio::spawn(background::reconciliation::run(
        pool.clone(),
        Arc::clone(&event_bus),
        jobs_cancel.clone(),
    ));
    let overdue_sweep = tokio::spawn(background::payment_due::run(
        pool.clone(),
        Arc::clone(&event_bus),
        jobs_cancel.clone(),
    ));
    tracing::info!("Background services running");

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        gateway,
        mailer,
    };
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // In-flight requests have drained; wind down the periodic jobs first,
    // then close the bus so the journal and inbox writers exit.
    tracing::info!("Draining background services");
    jobs_cancel.cancel();
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(drain, reconciliation).await;
    let _ = tokio::time::timeout(drain, overdue_sweep).await;

    drop(event_bus);
    let _ = tokio::time::timeout(drain, journal).await;
    let _ = tokio::time::timeout(drain, inbox).await;

    tracing::info!("Shutdown complete");
}

/// Connect, health-check, and migrate the database. Startup is the one
/// place where failing loudly beats limping along.
async fn connect_database() -> atelie_db::DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = atelie_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    atelie_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    atelie_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");
    pool
}

/// The Stripe client, when an API key is configured.
fn payment_gateway() -> Option<Arc<dyn PaymentGateway>> {
    match GatewayConfig::from_env() {
        Some(gateway_config) => {
            tracing::info!("Payment gateway configured");
            Some(Arc::new(StripeGateway::new(gateway_config)))
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, payment links disabled");
            None
        }
    }
}

/// The SMTP mailer, when a relay is configured.
fn mailer() -> Option<Arc<EmailDelivery>> {
    let email_config = match EmailConfig::from_env() {
        Some(c) => c,
        None => {
            tracing::warn!("SMTP_HOST not set, outbound email disabled");
            return None;
        }
    };
    let host = email_config.smtp_host.clone();
    match EmailDelivery::connect(email_config) {
        Ok(delivery) => {
            tracing::info!(%host, "SMTP mailer configured");
            Some(Arc::new(delivery))
        }
        Err(e) => {
            tracing::error!(error = %e, "SMTP relay rejected the configuration, email disabled");
            None
        }
    }
}

/// Resolves when the process is told to stop (SIGINT or SIGTERM), which
/// makes `axum::serve` stop accepting and drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
