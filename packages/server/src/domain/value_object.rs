//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum length of a display name, in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 32;

/// Connection handle value object.
///
/// Opaque handle into the lobby's connection arena. Sessions and the
/// matchmaking pool hold handles, never the channels themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new ConnectionId from its raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner u64 value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Display name value object.
///
/// The only identity a player has. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName.
    ///
    /// # Arguments
    ///
    /// * `name` - The name chosen by the player
    ///
    /// # Returns
    ///
    /// A Result containing the DisplayName or an error if validation fails
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        let len = trimmed.chars().count();
        if len > DISPLAY_NAME_MAX_CHARS {
            return Err(ValueObjectError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX_CHARS,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier value object.
///
/// Sessions created by the server carry a UUID v4 (see `SessionIdFactory`);
/// any non-empty string is accepted when parsing client input so that unknown
/// ids can be reported as an invalid session rather than a malformed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::SessionIdEmpty);
        }
        Ok(Self(id))
    }

    /// Create a SessionId from a UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side color. Also names the two seats of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Parse a color label sent by a client.
    pub fn parse(label: &str) -> Result<Self, ValueObjectError> {
        match label {
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            other => Err(ValueObjectError::ColorInvalid(other.to_string())),
        }
    }

    /// The other color.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algebraic square name, e.g. `e4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquareName(String);

impl SquareName {
    /// Create a new SquareName.
    ///
    /// Accepts a file `a`-`h` followed by a rank `1`-`8`.
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        let bytes = name.as_bytes();
        let valid = bytes.len() == 2
            && (b'a'..=b'h').contains(&bytes[0])
            && (b'1'..=b'8').contains(&bytes[1]);
        if !valid {
            return Err(ValueObjectError::SquareInvalid(name));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SquareName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Piece a pawn promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    /// Parse the single-letter promotion code (`q`, `r`, `b`, `n`).
    pub fn parse(code: &str) -> Result<Self, ValueObjectError> {
        match code.to_ascii_lowercase().as_str() {
            "q" => Ok(Self::Queen),
            "r" => Ok(Self::Rook),
            "b" => Ok(Self::Bishop),
            "n" => Ok(Self::Knight),
            _ => Err(ValueObjectError::PromotionInvalid(code.to_string())),
        }
    }
}

/// Opaque board position owned by a session.
///
/// Only the rules engine interprets it; the server treats it as text (FEN for
/// the chess engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position(String);

impl Position {
    pub fn new(repr: String) -> Self {
        Self(repr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final result reported in `game_over`.
///
/// `Draw` covers every terminal state that is not checkmate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Checkmate,
    Draw,
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
