// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SFMC Connector API Server
//!
//! Accepts webform submissions, subscribes them in Salesforce Marketing
//! Cloud, and exposes a batch endpoint for records still pending.

use anyhow::Context;
use sfmc_connector::{
    config::Config,
    db::{JsonRecordStore, JsonSettingsStore, Settings},
    services::{SfmcClient, SyncOrchestrator},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting SFMC connector");

    // Open settings and record stores
    let settings_store = JsonSettingsStore::open(&config.settings_path).with_context(|| {
        format!("Failed to open settings {}", config.settings_path.display())
    })?;
    let settings = Settings::new(Arc::new(settings_store));

    let records = JsonRecordStore::open(&config.records_path).with_context(|| {
        format!("Failed to open records {}", config.records_path.display())
    })?;
    tracing::info!(
        settings = %config.settings_path.display(),
        records = %config.records_path.display(),
        "Stores opened"
    );

    // Misconfigured mappings are reported, not fatal
    for (webform_id, reason) in settings.validate_webform_mappings() {
        tracing::warn!(webform_id = %webform_id, reason = %reason, "Invalid webform mapping");
    }
    if let Err(e) = settings.api() {
        tracing::warn!(error = %e, "SFMC API settings incomplete; syncs will fail until fixed");
    }

    let client = SfmcClient::new(config.http_timeout());
    let sync = SyncOrchestrator::from_parts(settings, Arc::new(records), client);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        sync,
    });

    // Build router
    let app = sfmc_connector::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sfmc_connector=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
