//! contact-gate server binary.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_gate::adapters::culqi::{CulqiConfig, CulqiGateway, MockGateway};
use contact_gate::adapters::http::{app, AppState};
use contact_gate::adapters::memory::InMemoryStore;
use contact_gate::adapters::postgres::{
    PostgresAccessGrants, PostgresLedger, PostgresProductCatalog, PostgresUnlockStore,
    PostgresUserRepository, PostgresWebhookEvents,
};
use contact_gate::config::AppConfig;
use contact_gate::domain::foundation::Timestamp;
use contact_gate::ports::{PaymentGateway, WebhookEventRepository};

/// Webhook claims older than this are purged; the gateway stops redelivering
/// long before.
const WEBHOOK_RETENTION_DAYS: i64 = 30;
const PURGE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server.log_level, config.server.log_json);
    config.validate()?;

    let gateway: Arc<dyn PaymentGateway> = if config.gateway.is_configured() {
        let culqi = CulqiConfig::new(config.gateway.api_key.clone())
            .with_base_url(&config.gateway.api_url)
            .with_timeout(config.gateway.timeout());
        tracing::info!(
            api_url = %config.gateway.api_url,
            test_mode = config.gateway.is_test_mode(),
            "Using Culqi gateway"
        );
        Arc::new(CulqiGateway::new(culqi)?)
    } else {
        tracing::warn!("No gateway key configured, every charge will be approved by the mock gateway");
        Arc::new(MockGateway::new())
    };

    let mut state = if config.database.is_configured() {
        let pool = config
            .database
            .pool_options()
            .connect(config.database.url.trim())
            .await?;
        if config.database.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied");
        }
        AppState::new(
            Arc::new(PostgresUnlockStore::new(pool.clone())),
            Arc::new(PostgresLedger::new(pool.clone())),
            Arc::new(PostgresAccessGrants::new(pool.clone())),
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresProductCatalog::new(pool.clone())),
            Arc::new(PostgresWebhookEvents::new(pool)),
            gateway,
        )
    } else {
        tracing::warn!("No database configured, using the in-memory store");
        AppState::in_memory(InMemoryStore::new(), gateway)
    };
    state.charge_settings = config.charge_settings()?;
    state.amount_policy = config.pricing.amount_policy()?;
    state.subscription_policy = config.pricing.subscription_policy();

    tokio::spawn(purge_webhook_events(state.webhook_events.clone()));

    let addr = config.server.socket_addr()?;
    let router = app(state, config.server.request_timeout());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "contact-gate listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn purge_webhook_events(events: Arc<dyn WebhookEventRepository>) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        let cutoff = Timestamp::now().minus_days(WEBHOOK_RETENTION_DAYS);
        match events.delete_before(cutoff).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Purged old webhook events"),
            Err(err) => tracing::warn!(error = %err, "Failed to purge webhook events"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
