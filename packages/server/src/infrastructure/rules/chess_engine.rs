//! Standard chess rules backed by the `chess` crate.
//!
//! Positions are exchanged with the domain as FEN text.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, File, Game, Piece, Rank, Square};

use crate::domain::{MoveRecord, MoveVerdict, Position, Promotion, RulesEngine, SquareName};

/// Chess rules engine.
///
/// Game over covers checkmate, stalemate and insufficient material (bare kings,
/// a single minor piece, or bishops all on one square colour). Threefold
/// repetition and the fifty-move rule need the move history and are answered
/// by `is_draw_by_history`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChessRulesEngine;

impl ChessRulesEngine {
    pub fn new() -> Self {
        Self
    }

    fn board(position: &Position) -> Option<Board> {
        match Board::from_str(position.as_str()) {
            Ok(board) => Some(board),
            Err(e) => {
                tracing::warn!("Unparseable position '{}': {:?}", position, e);
                None
            }
        }
    }
}

impl RulesEngine for ChessRulesEngine {
    fn new_game(&self) -> Position {
        Position::new(Board::default().to_string())
    }

    fn apply_move(&self, position: &Position, mv: &MoveRecord) -> MoveVerdict {
        let Some(board) = Self::board(position) else {
            return MoveVerdict::Illegal;
        };
        let candidate = to_chess_move(&board, mv);
        if !board.legal(candidate) {
            return MoveVerdict::Illegal;
        }
        MoveVerdict::Legal(Position::new(board.make_move_new(candidate).to_string()))
    }

    fn is_game_over(&self, position: &Position) -> bool {
        Self::board(position).is_some_and(|board| {
            board.status() != BoardStatus::Ongoing || insufficient_material(&board)
        })
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        Self::board(position).is_some_and(|board| board.status() == BoardStatus::Checkmate)
    }

    fn is_draw_by_history(&self, initial: &Position, moves: &[MoveRecord]) -> bool {
        let Some(board) = Self::board(initial) else {
            return false;
        };
        let mut game = Game::new_with_board(board);
        for mv in moves {
            let candidate = to_chess_move(&game.current_position(), mv);
            if !game.make_move(candidate) {
                tracing::warn!(
                    "Move log does not replay from '{}' at {}{}",
                    initial,
                    mv.from,
                    mv.to
                );
                return false;
            }
        }
        game.can_declare_draw()
    }
}

fn to_chess_move(board: &Board, mv: &MoveRecord) -> ChessMove {
    let from = to_square(&mv.from);
    let to = to_square(&mv.to);
    ChessMove::new(from, to, promotion_piece(board, from, to, mv.promotion))
}

fn to_square(name: &SquareName) -> Square {
    // SquareName guarantees [a-h][1-8]
    let bytes = name.as_str().as_bytes();
    let file = File::from_index(usize::from(bytes[0] - b'a'));
    let rank = Rank::from_index(usize::from(bytes[1] - b'1'));
    Square::make_square(rank, file)
}

/// Promotion piece for a pawn reaching the last rank; queen unless requested otherwise.
fn promotion_piece(
    board: &Board,
    from: Square,
    to: Square,
    requested: Option<Promotion>,
) -> Option<Piece> {
    let pawn_move = board.piece_on(from) == Some(Piece::Pawn);
    let last_rank = matches!(to.get_rank(), Rank::First | Rank::Eighth);
    if !(pawn_move && last_rank) {
        return None;
    }
    Some(match requested.unwrap_or(Promotion::Queen) {
        Promotion::Queen => Piece::Queen,
        Promotion::Rook => Piece::Rook,
        Promotion::Bishop => Piece::Bishop,
        Promotion::Knight => Piece::Knight,
    })
}

fn insufficient_material(board: &Board) -> bool {
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }
    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    if (knights | bishops).popcnt() <= 1 {
        return true;
    }
    knights.popcnt() == 0 && {
        let mut colors = bishops.map(square_color);
        colors
            .next()
            .is_some_and(|first| colors.all(|color| color == first))
    }
}

/// 0 for dark squares, 1 for light squares.
fn square_color(square: Square) -> usize {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2
}
