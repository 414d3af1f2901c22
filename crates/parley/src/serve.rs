// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve`: wires storage, dispatcher, pipeline and HTTP server.

use std::sync::Arc;

use parley_agent::WebhookPipeline;
use parley_config::ParleyConfig;
use parley_core::{Adapter, HealthStatus, MessageStore, ParleyError};
use parley_gateway::{AppState, spawn_sweeper, start_server};
use parley_storage::SqliteStore;
use parley_whatsapp::WhatsAppClient;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the server until SIGINT/SIGTERM, then shuts adapters down.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.server.log_level);

    info!("starting parley serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    info!(path = %config.storage.database_path, "message store ready");

    let dispatcher = Arc::new(WhatsAppClient::new(&config.whatsapp)?);
    if let Ok(HealthStatus::Degraded(reason)) = dispatcher.health_check().await {
        warn!(%reason, "outbound dispatcher is not fully configured; replies will fail");
    }
    if config.auth.api_key.is_none() {
        warn!("no auth.api_key configured; admin endpoints will reject every request");
    }

    let pipeline = Arc::new(WebhookPipeline::new(
        store.clone(),
        dispatcher.clone(),
        &config,
    ));
    let config = Arc::new(config);
    let state = AppState::new(pipeline, Arc::clone(&config));

    let cancel = shutdown::install_signal_handler();

    let sweeper = state.limiter.as_ref().map(|limiter| {
        info!(
            capacity = config.rate_limit.capacity,
            refill_tokens = config.rate_limit.refill_tokens,
            refill_period_secs = config.rate_limit.refill_period_secs,
            "rate limiter enabled"
        );
        spawn_sweeper(
            Arc::clone(limiter),
            config.rate_limit.sweep_interval(),
            config.rate_limit.idle_ttl(),
            cancel.clone(),
        )
    });

    let served = start_server(state, cancel.clone()).await;
    cancel.cancel();

    if let Some(handle) = sweeper
        && let Err(e) = handle.await
    {
        warn!(error = %e, "rate limiter sweeper did not stop cleanly");
    }
    if let Err(e) = store.shutdown().await {
        error!(error = %e, "store shutdown failed");
    }

    served?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
