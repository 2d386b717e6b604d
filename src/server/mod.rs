//! HTTP server for ChatRelay
//!
//! Builds the axum router (chat, liveness and session routes plus the
//! static UI bundle) and runs it until Ctrl-C.

pub mod handlers;
pub mod response;

use crate::config::Config;
use crate::error::Result;
use crate::providers::OpenAiClient;
use crate::relay::ChatRelay;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use response::ErrorBody;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The relay handling chat requests
    pub relay: Arc<ChatRelay>,
}

impl AppState {
    /// Wrap a relay
    pub fn new(relay: ChatRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Build the application router
///
/// # Arguments
///
/// * `state` - Shared handler state
/// * `config` - Server configuration (static dir, body limit, CORS)
///
/// # Returns
///
/// Returns a router ready to be served
pub fn build_router(state: AppState, config: &Config) -> Router {
    let static_dir = &config.server.static_dir;
    let assets = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let router = Router::new()
        .route("/api/test", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/session/:id", delete(handlers::reset_session))
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(response::panic_response))
        .with_state(state);

    if config.server.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Run the relay server until Ctrl-C
///
/// # Errors
///
/// Returns error if the client cannot be created or the listener cannot
/// be bound
pub async fn serve(config: Config) -> Result<()> {
    let client = OpenAiClient::new(&config.provider)?;
    let relay = ChatRelay::from_config(Arc::new(client), &config);
    let mode = relay.mode();
    let app = build_router(AppState::new(relay), &config);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    tracing::info!("Server running at http://{}", listener.local_addr()?);
    tracing::info!(
        "API key: {}",
        if config.has_api_key() {
            "Present"
        } else {
            "Missing"
        }
    );
    tracing::info!("Conversation mode: {}", mode);
    if !config.server.static_dir.is_dir() {
        tracing::warn!(
            "Static directory {} does not exist; only API routes will respond",
            config.server.static_dir.display()
        );
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
