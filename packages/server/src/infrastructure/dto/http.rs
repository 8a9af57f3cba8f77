//! HTTP API response DTOs for the session server.

use serde::{Deserialize, Serialize};

use crate::domain::{Color, MoveRecord, SessionStatus};

/// Session summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummaryDto {
    pub id: String,
    pub white: String,
    pub black: String,
    pub spectators: usize,
    pub turn: Color,
    pub status: SessionStatus,
    pub moves: usize,
    pub created_at: String, // ISO 8601
}

/// Session detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetailDto {
    pub id: String,
    pub white: String,
    pub black: String,
    pub spectators: Vec<String>,
    pub turn: Color,
    pub status: SessionStatus,
    /// FEN
    pub position: String,
    pub moves: Vec<MoveRecord>,
    pub created_at: String, // ISO 8601
}
