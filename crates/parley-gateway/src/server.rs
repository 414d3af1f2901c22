// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the HTTP server loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, patch, post, put};
use parley_agent::WebhookPipeline;
use parley_config::model::ParleyConfig;
use parley_core::ParleyError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admission_gate;
use crate::handlers;
use crate::ratelimit::{RateLimiter, rate_limit_middleware};

/// Shared state for axum handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WebhookPipeline>,
    pub config: Arc<ParleyConfig>,
    /// `None` when rate limiting is disabled.
    pub limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// Builds the state, creating a limiter when `rate_limit.enabled`.
    pub fn new(pipeline: Arc<WebhookPipeline>, config: Arc<ParleyConfig>) -> Self {
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));
        Self {
            pipeline,
            config,
            limiter,
        }
    }
}

/// Builds the full router.
///
/// Layer order, outermost first: trace, CORS, admission gate, rate limiter.
/// The gate therefore rejects unauthenticated traffic before it can spend
/// a client's tokens.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        );

    let admin_routes = Router::new()
        .route(
            "/admin/intents",
            get(handlers::list_intents).post(handlers::create_intent),
        )
        .route(
            "/admin/intents/{id}",
            put(handlers::update_intent).delete(handlers::delete_intent),
        )
        .route(
            "/admin/conversations/{id}",
            get(handlers::conversation_history).patch(handlers::update_conversation),
        )
        .route("/admin/users/{user_id}", patch(handlers::update_user))
        .route("/whatsapp/send/text", post(handlers::send_text))
        .route("/whatsapp/send/template", post(handlers::send_template))
        .route("/whatsapp/send/media", post(handlers::send_media))
        .route("/whatsapp/phone-info", get(handlers::phone_info));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admission_gate,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `server.host:server.port` and serves until `shutdown` fires.
pub async fn start_server(state: AppState, shutdown: CancellationToken) -> Result<(), ParleyError> {
    let addr = state.config.server.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("Parley listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| ParleyError::Internal(format!("server error: {e}")))?;

    Ok(())
}
