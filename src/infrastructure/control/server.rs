//! Control API server built on axum.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::application::errors::BotError;
use crate::application::services::connection_service::ConnectionSnapshot;
use crate::domain::traits::MessagingProvider;
use crate::infrastructure::config::ControlConfig;
use super::handlers;

/// Shared state for the request handlers
#[derive(Clone)]
pub struct ControlState {
    /// Latest connection snapshot published by the runtime
    pub status: watch::Receiver<ConnectionSnapshot>,
    /// Session used for manual sends
    pub provider: Arc<dyn MessagingProvider>,
}

/// Routes of the control API, with permissive CORS for the browser panel
pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/send-message", post(handlers::post_send_message))
        .route("/api/messages", get(handlers::get_messages))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Serve on an already bound listener until `shutdown` flips to true
pub async fn serve(
    listener: TcpListener,
    state: ControlState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), BotError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| BotError::Network(format!("control server error: {}", e)))
}

/// Bind to the configured address and serve
pub async fn start_server(
    config: &ControlConfig,
    state: ControlState,
    shutdown: watch::Receiver<bool>,
) -> Result<(), BotError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BotError::Network(format!("failed to bind control API to {}: {}", addr, e)))?;

    tracing::info!("Control API listening on http://{}", addr);
    serve(listener, state, shutdown).await
}
