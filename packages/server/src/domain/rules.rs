//! Rules engine port.
//!
//! The domain never inspects a position itself. Legality and game-end
//! detection are delegated to an implementation of [`RulesEngine`]
//! (see `infrastructure::rules`).

use super::{GameResult, MoveRecord, Position};

/// Verdict of the rules engine for a proposed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveVerdict {
    /// The move is legal; carries the resulting position.
    Legal(Position),
    /// The move is not legal in the given position.
    Illegal,
}

/// Capability to start games and judge moves.
#[cfg_attr(test, mockall::automock)]
pub trait RulesEngine: Send + Sync {
    /// Standard starting position.
    fn new_game(&self) -> Position;

    /// Attempt `mv` on `position`.
    fn apply_move(&self, position: &Position, mv: &MoveRecord) -> MoveVerdict;

    /// Whether the game has ended in `position`.
    fn is_game_over(&self, position: &Position) -> bool;

    /// Whether the side to move in `position` is checkmated.
    fn is_checkmate(&self, position: &Position) -> bool;

    /// Whether `moves`, played from `initial`, end in a draw that only the
    /// game history reveals (repetition, move-count rules).
    fn is_draw_by_history(&self, initial: &Position, moves: &[MoveRecord]) -> bool;
}

/// Terminal result of a game that reached `position` by playing `moves`
/// from `initial`, if any.
pub fn game_result(
    rules: &dyn RulesEngine,
    initial: &Position,
    moves: &[MoveRecord],
    position: &Position,
) -> Option<GameResult> {
    if !rules.is_game_over(position) && !rules.is_draw_by_history(initial, moves) {
        return None;
    }
    if rules.is_checkmate(position) {
        Some(GameResult::Checkmate)
    } else {
        Some(GameResult::Draw)
    }
}
