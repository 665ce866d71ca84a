//! credit-ledger server entry point.
//!
//! Starts the Axum HTTP server, the optional persistence tasks and the
//! notifier.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use credit_ledger::api;
use credit_ledger::app_state::{AccessKeys, AppState};
use credit_ledger::config::LedgerConfig;
use credit_ledger::domain::{Collections, EventBus};
use credit_ledger::notify::Notifier;
use credit_ledger::persistence::{PostgresPersistence, sync};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = LedgerConfig::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting credit-ledger");

    // Build domain layer
    let collections = Arc::new(Collections::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Restore state and start persistence tasks
    let store = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;

        let store = PostgresPersistence::new(pool);
        let restored = sync::restore(&store, &collections).await?;
        tracing::info!(?restored, "state restored");

        if config.event_log_enabled {
            tokio::spawn(sync::run_event_log(store.clone(), event_bus.subscribe()));
        }
        tokio::spawn(sync::run_snapshots(
            store.clone(),
            Arc::clone(&collections),
            Duration::from_secs(config.snapshot_interval_secs),
            config.cleanup_after_days,
        ));
        Some(store)
    } else {
        tracing::warn!("persistence disabled; state lives in memory only");
        None
    };

    // Start notifier
    if let Some(url) = config.notify_url.clone() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building notification client")?;
        let notifier = Notifier::new(client, url, config.notify_token.clone());
        tokio::spawn(notifier.run(event_bus.subscribe()));
    }

    // Build application state
    let app_state = AppState::new(
        Arc::clone(&collections),
        event_bus,
        config.policy(),
        AccessKeys::from(&config),
    );

    // Build router
    let app = api::build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            ))),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = store {
        let written = sync::snapshot(&store, &collections).await?;
        tracing::info!(written, "final snapshot stored");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
