//! WebSocket message DTOs for the session server.
//!
//! Every message is a JSON object with a `type` discriminator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Color, GameResult, MoveCommand};

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Welcome,
    Spectator,
    Error,
    Start,
    Turn,
    Move,
    GameOver,
}

/// Errors classifying an inbound frame.
///
/// The `Display` text is sent back to the sender.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not JSON, no `type`, or fields that do not match the tag
    #[error("Invalid message format.")]
    MalformedMessage(String),

    /// A `type` the server does not handle
    #[error("Unknown message type.")]
    UnknownType(String),
}

/// `join` request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

/// `move` request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(alias = "gameId")]
    pub session_id: String,
    pub from: String,
    pub to: String,
    pub color: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

impl From<MoveRequest> for MoveCommand {
    fn from(request: MoveRequest) -> Self {
        Self {
            session_id: request.session_id,
            from: request.from,
            to: request.to,
            color: request.color,
            promotion: request.promotion,
        }
    }
}

/// Inbound message from a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join(JoinRequest),
    Move(MoveRequest),
}

impl ClientMessage {
    const KNOWN_TYPES: [&'static str; 2] = ["join", "move"];

    /// Classify and parse a text frame.
    ///
    /// # Errors
    ///
    /// * `UnknownType` - `type` is a string the server does not handle
    /// * `MalformedMessage` - anything else that does not parse
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedMessage(e.to_string()))?;

        let Some(tag) = value.get("type").and_then(serde_json::Value::as_str) else {
            return Err(ProtocolError::MalformedMessage(
                "missing string field 'type'".to_string(),
            ));
        };
        if !Self::KNOWN_TYPES.contains(&tag) {
            return Err(ProtocolError::UnknownType(tag.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::MalformedMessage(e.to_string()))
    }
}

/// Sent to a player queued in the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMessage {
    pub r#type: MessageType,
    /// 1-based position in the pool
    pub player_id: usize,
    pub name: String,
}

/// Sent to a joiner routed to spectating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectatorMessage {
    pub r#type: MessageType,
    pub message: String,
    /// Absent when there is no session to watch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

/// Targeted error reply, or the termination notice after a disconnect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub message: String,
}

/// Sent to each seated player when a session starts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMessage {
    pub r#type: MessageType,
    pub game_id: String,
    pub color: Color,
    /// Whether the board should be drawn from black's side
    pub flipped: bool,
    pub first_player: Color,
}

/// Side to move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub r#type: MessageType,
    pub turn: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub from: String,
    pub to: String,
}

/// Accepted move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveMessage {
    pub r#type: MessageType,
    pub r#move: MovePayload,
}

/// Game concluded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverMessage {
    pub r#type: MessageType,
    pub result: GameResult,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            message: message.into(),
        }
    }
}

impl TurnMessage {
    pub fn new(turn: Color) -> Self {
        Self {
            r#type: MessageType::Turn,
            turn,
        }
    }
}
