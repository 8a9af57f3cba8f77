//! Domain layer for the session server.
//!
//! This module contains game and matchmaking logic that is independent of
//! data transfer objects (DTOs), transport and the concrete rules engine.

pub mod entity;
pub mod error;
pub mod factory;
pub mod lobby;
pub mod matchmaking;
pub mod registry;
pub mod rules;
pub mod value_object;

pub use entity::{
    AppliedMove, Connection, MoveCommand, MoveRecord, Role, SeatPolicy, Seats, Session,
    SessionStatus,
};
pub use error::{GameError, ValueObjectError};
pub use factory::SessionIdFactory;
pub use lobby::{DisconnectOutcome, JoinOutcome, Lobby};
pub use matchmaking::MatchmakingPool;
pub use registry::{SessionRegistry, SpectatorTargetPolicy, most_recent_active};
pub use rules::{MoveVerdict, RulesEngine, game_result};
pub use value_object::{
    Color, ConnectionId, DisplayName, GameResult, Position, Promotion, SessionId, SquareName,
    Timestamp,
};
