//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// SessionId validation error
    #[error("SessionId cannot be empty")]
    SessionIdEmpty,

    /// Square is not an algebraic square name such as `e4`
    #[error("Invalid square name: {0}")]
    SquareInvalid(String),

    /// Promotion piece is not one of q, r, b, n
    #[error("Invalid promotion piece: {0}")]
    PromotionInvalid(String),

    /// Color is neither `white` nor `black`
    #[error("Invalid color: {0}")]
    ColorInvalid(String),
}

/// Errors raised by game sessions and matchmaking.
///
/// The `Display` text is sent verbatim to the client in an `error` message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The move references a session that does not exist or has ended
    #[error("Invalid game.")]
    InvalidSession,

    /// The declared color is not the side to move
    #[error("It's not your turn yet.")]
    OutOfTurn,

    /// The rules engine rejected the move
    #[error("Invalid move.")]
    IllegalMove,

    /// The connection is already waiting, playing or spectating
    #[error("You have already joined.")]
    AlreadyJoined,

    /// The connection handle is not registered in the lobby
    #[error("Unknown connection.")]
    ConnectionNotFound,

    /// A seated player left; the session is over
    #[error("Opponent disconnected. Game over.")]
    PeerDisconnected,
}
