//! Core domain models for the session server.

use serde::{Deserialize, Serialize};

use super::{
    error::GameError,
    rules::{MoveVerdict, RulesEngine, game_result},
    value_object::{
        Color, ConnectionId, DisplayName, GameResult, Position, Promotion, SessionId, SquareName,
        Timestamp,
    },
};

/// What a connection is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Connected, not joined (or left over after a session ended)
    Idle,
    /// Waiting in the matchmaking pool
    Waiting,
    /// Holding a seat in a session
    Seated(Color),
    /// Watching a session
    Spectating,
}

/// One remote party with an open channel.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Arena handle
    pub id: ConnectionId,
    pub role: Role,
    /// Set on `join`
    pub display_name: Option<DisplayName>,
    /// Session the connection is seated in or watching
    pub session_id: Option<SessionId>,
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a new idle connection
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            role: Role::Idle,
            display_name: None,
            session_id: None,
            connected_at,
        }
    }

    /// Seat color, if the connection plays.
    pub fn seat(&self) -> Option<Color> {
        match self.role {
            Role::Seated(color) => Some(color),
            _ => None,
        }
    }

    /// Whether the connection already took part in matchmaking.
    pub fn has_joined(&self) -> bool {
        self.role != Role::Idle
    }

    /// Return to the idle state, detached from any session.
    pub fn reset(&mut self) {
        self.role = Role::Idle;
        self.session_id = None;
    }
}

/// A move as submitted by a client, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCommand {
    pub session_id: String,
    pub from: String,
    pub to: String,
    /// Color the client claims to play
    pub color: String,
    pub promotion: Option<String>,
}

/// A validated move, as stored in the move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: SquareName,
    pub to: SquareName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
}

impl MoveRecord {
    pub fn new(from: SquareName, to: SquareName, promotion: Option<Promotion>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }
}

/// How strictly a move is bound to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeatPolicy {
    /// Accept a move whose declared color is on turn, whoever sends it.
    #[default]
    TrustDeclaredColor,
    /// Additionally require the requester to hold the seat on turn.
    BindToSeat,
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// The two seats of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seats {
    pub white: ConnectionId,
    pub black: ConnectionId,
}

impl Seats {
    /// Connection holding the seat of `color`
    pub fn get(&self, color: Color) -> ConnectionId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// Outcome of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub record: MoveRecord,
    /// Side to move after this move
    pub turn: Color,
    /// Set when the move ended the game
    pub result: Option<GameResult>,
}

/// One paired game: two seats, spectators, and the authoritative position.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub seats: Seats,
    /// Insertion order
    pub spectators: Vec<ConnectionId>,
    pub initial_position: Position,
    pub position: Position,
    pub turn: Color,
    pub move_log: Vec<MoveRecord>,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    /// Monotonic creation order within the lobby
    pub sequence: u64,
}

impl Session {
    /// Create a new active session with white to move
    pub fn new(
        id: SessionId,
        seats: Seats,
        position: Position,
        created_at: Timestamp,
        sequence: u64,
    ) -> Self {
        Self {
            id,
            seats,
            spectators: Vec::new(),
            initial_position: position.clone(),
            position,
            turn: Color::White,
            move_log: Vec::new(),
            status: SessionStatus::Active,
            created_at,
            sequence,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Seats first (white, black), then spectators in insertion order.
    pub fn members(&self) -> Vec<ConnectionId> {
        let mut members = Vec::with_capacity(2 + self.spectators.len());
        members.push(self.seats.white);
        members.push(self.seats.black);
        members.extend(self.spectators.iter().copied());
        members
    }

    pub fn add_spectator(&mut self, id: ConnectionId) {
        if !self.spectators.contains(&id) {
            self.spectators.push(id);
        }
    }

    /// Returns whether `id` was spectating.
    pub fn remove_spectator(&mut self, id: ConnectionId) -> bool {
        let before = self.spectators.len();
        self.spectators.retain(|s| *s != id);
        self.spectators.len() != before
    }

    /// Validate and apply a move.
    ///
    /// Checks run in order: session active, declared color on turn (and, with
    /// [`SeatPolicy::BindToSeat`], requester holds that seat), rules engine
    /// legality. A failure leaves the session untouched.
    ///
    /// # Errors
    ///
    /// `InvalidSession`, `OutOfTurn` or `IllegalMove`
    pub fn apply_move(
        &mut self,
        requester: ConnectionId,
        command: &MoveCommand,
        rules: &dyn RulesEngine,
        policy: SeatPolicy,
    ) -> Result<AppliedMove, GameError> {
        if !self.is_active() {
            return Err(GameError::InvalidSession);
        }

        let claimed = Color::parse(&command.color).map_err(|_| GameError::OutOfTurn)?;
        if claimed != self.turn {
            return Err(GameError::OutOfTurn);
        }
        if policy == SeatPolicy::BindToSeat && self.seats.get(self.turn) != requester {
            return Err(GameError::OutOfTurn);
        }

        let record = parse_move(command).ok_or(GameError::IllegalMove)?;
        let next_position = match rules.apply_move(&self.position, &record) {
            MoveVerdict::Legal(position) => position,
            MoveVerdict::Illegal => return Err(GameError::IllegalMove),
        };

        self.position = next_position;
        self.move_log.push(record.clone());
        self.turn = self.turn.opponent();

        let result = game_result(
            rules,
            &self.initial_position,
            &self.move_log,
            &self.position,
        );
        if result.is_some() {
            self.status = SessionStatus::Ended;
        }

        Ok(AppliedMove {
            record,
            turn: self.turn,
            result,
        })
    }

    /// Replay the move log from the initial position.
    ///
    /// Returns `None` if the engine rejects a logged move.
    pub fn replay(&self, rules: &dyn RulesEngine) -> Option<Position> {
        self.move_log
            .iter()
            .try_fold(self.initial_position.clone(), |position, mv| {
                match rules.apply_move(&position, mv) {
                    MoveVerdict::Legal(next) => Some(next),
                    MoveVerdict::Illegal => None,
                }
            })
    }
}

fn parse_move(command: &MoveCommand) -> Option<MoveRecord> {
    let from = SquareName::new(command.from.clone()).ok()?;
    let to = SquareName::new(command.to.clone()).ok()?;
    let promotion = match command.promotion.as_deref() {
        Some(code) => Some(Promotion::parse(code).ok()?),
        None => None,
    };
    Some(MoveRecord::new(from, to, promotion))
}
