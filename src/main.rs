//! ValeZap - conversation relay between players and a workflow backend
//!
//! Players open a session, send messages that are forwarded to the backend
//! webhook, and read back the recorded conversation. The backend can also
//! push messages on its own through the relay webhook.

mod api;
mod config;
mod db;
mod dispatch;
mod error;
mod identity;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use axum::http::HeaderValue;
use config::AppConfig;
use db::Database;
use dispatch::{LoggingDispatcher, WebhookDispatcher};
use runtime::ConversationService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("valezap={},tower_http=info", config.log_level).into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    tracing::debug!(?config, "Configuration loaded");

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let webhook = WebhookDispatcher::new(
        config.backend_url.clone(),
        config.backend_api_key.clone(),
        config.backend_timeout,
    )?;
    let dispatcher = Arc::new(LoggingDispatcher::new(Arc::new(webhook)));
    tracing::info!(
        url = %config.backend_url,
        timeout_ms = %config.backend_timeout.as_millis(),
        "Backend dispatcher configured"
    );

    if config.webhook_api_key.is_none() {
        tracing::warn!("VALEZAP_WEBHOOK_API_KEY is not set; relay pushes will be rejected");
    }

    let service = ConversationService::new(
        db.clone(),
        dispatcher,
        config.limits,
        config.webhook_api_key.clone(),
    );
    let state = AppState::new(service, config.session_ttl);

    let mut app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new().gzip(true).br(true));

    if !config.allowed_origins.is_empty() {
        let origins = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect::<Vec<_>>();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "ValeZap server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    db.close()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
