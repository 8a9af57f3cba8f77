//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use banmen_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    domain::{ConnectionId, Lobby, Session, SessionId},
    infrastructure::dto::http::{SessionDetailDto, SessionSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of sessions, oldest first
pub async fn get_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummaryDto>> {
    let lobby = state.lobby.lock().await;

    let summaries = lobby
        .sessions()
        .into_iter()
        .map(|session| SessionSummaryDto {
            id: session.id.as_str().to_string(),
            white: name_of(&lobby, session.seats.white),
            black: name_of(&lobby, session.seats.black),
            spectators: session.spectators.len(),
            turn: session.turn,
            status: session.status,
            moves: session.move_log.len(),
            created_at: timestamp_to_jst_rfc3339(session.created_at.value()),
        })
        .collect();

    Json(summaries)
}

/// Get session detail by ID
pub async fn get_session_detail(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetailDto>, StatusCode> {
    let lobby = state.lobby.lock().await;

    let Some(session) = find_session(&lobby, &session_id) else {
        return Err(StatusCode::NOT_FOUND);
    };

    let detail = SessionDetailDto {
        id: session.id.as_str().to_string(),
        white: name_of(&lobby, session.seats.white),
        black: name_of(&lobby, session.seats.black),
        spectators: session
            .spectators
            .iter()
            .map(|id| name_of(&lobby, *id))
            .collect(),
        turn: session.turn,
        status: session.status,
        position: session.position.as_str().to_string(),
        moves: session.move_log.clone(),
        created_at: timestamp_to_jst_rfc3339(session.created_at.value()),
    };

    Ok(Json(detail))
}

fn find_session<'a>(lobby: &'a Lobby, session_id: &str) -> Option<&'a Session> {
    let id = SessionId::new(session_id.to_string()).ok()?;
    lobby.session(&id)
}

fn name_of(lobby: &Lobby, id: ConnectionId) -> String {
    lobby
        .display_name(id)
        .map(|name| name.as_str().to_string())
        .unwrap_or_default()
}
