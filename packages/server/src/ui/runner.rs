//! Router construction and the server main loop.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_session_detail, get_sessions, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};
use crate::{config::ServerConfig, error::ServerError};

/// Build the application router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/sessions", get(get_sessions))
        .route("/api/sessions/{session_id}", get(get_session_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, serve until a shutdown signal arrives, then return.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_address();
    let state = Arc::new(AppState::chess(config.seat_policy()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(
        "Listening on {} (seat policy: {:?})",
        listener.local_addr()?,
        config.seat_policy()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
