//! donation-alarm server entry point.
//!
//! Starts the Axum HTTP server with REST, webhook and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use donation_alarm::api;
use donation_alarm::app_state::{AppState, WebhookSettings};
use donation_alarm::config::AppConfig;
use donation_alarm::dispatch::spawn_dispatch_core;
use donation_alarm::identity::TwitchClient;
use donation_alarm::payments::StripeClient;
use donation_alarm::persistence::{DonationStore, MemoryStore, PostgresStore, StreamerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config =
        AppConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting donation-alarm");

    // Build persistence layer
    let (donations, streamers): (Arc<dyn DonationStore>, Arc<dyn StreamerStore>) =
        if config.persistence_enabled {
            let store = PostgresStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            store.migrate().await.context("failed to run migrations")?;
            tracing::info!("persistence: postgres");
            let store = Arc::new(store);
            (Arc::clone(&store) as _, store as _)
        } else {
            tracing::warn!("persistence disabled; records are kept in memory");
            let store = Arc::new(MemoryStore::new());
            (Arc::clone(&store) as _, store as _)
        };

    // Start the dispatch core
    let (hub, event_bus) = spawn_dispatch_core(config.hub, config.event_bus_capacity)
        .context("failed to start dispatch core")?;

    // Build application state
    let app_state = AppState {
        donations,
        streamers,
        payments: Arc::new(StripeClient::new(
            config.payments.secret_key.clone(),
            config.http_timeout,
        )),
        identity: Arc::new(TwitchClient::new(config.twitch.clone(), config.http_timeout)),
        hub,
        event_bus,
        webhook: WebhookSettings {
            secret: config.payments.webhook_secret.clone(),
            tolerance: config.payments.webhook_tolerance,
        },
        currency: config.payments.currency.clone(),
        ws_outbound_capacity: config.ws_outbound_capacity,
    };

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
