//! Pseudo-legal move generation.
//!
//! Destinations are generated per piece without any check filtering: a move
//! that leaves the mover's own king attacked is still generated.

use serde::{Deserialize, Serialize};

use crate::{Board, Color, Move, MoveKind, Piece, PieceKind, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Generate every destination for the piece on `from`.
///
/// Returns an empty list if the square is empty.
pub fn legal_destinations(board: &Board, from: Square) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };
    let mut moves = Vec::with_capacity(16);

    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece, &mut moves),
        PieceKind::Knight => step_moves(board, from, piece, &KNIGHT_OFFSETS, &mut moves),
        PieceKind::King => step_moves(board, from, piece, &KING_OFFSETS, &mut moves),
        PieceKind::Rook => ray_moves(board, from, piece, &ORTHOGONAL, &mut moves),
        PieceKind::Bishop => ray_moves(board, from, piece, &DIAGONAL, &mut moves),
        PieceKind::Queen => {
            ray_moves(board, from, piece, &ORTHOGONAL, &mut moves);
            ray_moves(board, from, piece, &DIAGONAL, &mut moves);
        }
    }

    moves
}

/// Generate every move available to `color`, scanning squares row-major.
pub fn all_moves(board: &Board, color: Color) -> Vec<Move> {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == color)
        .flat_map(|(sq, _)| legal_destinations(board, sq))
        .collect()
}

fn pawn_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let dir = piece.color.forward();

    if let Some(one) = from.offset(dir, 0) {
        if board.is_empty(one) {
            moves.push(quiet(from, one, piece, MoveKind::Quiet));

            if from.row() == piece.color.pawn_row() {
                if let Some(two) = one.offset(dir, 0) {
                    if board.is_empty(two) {
                        moves.push(quiet(from, two, piece, MoveKind::DoubleStep));
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        if let Some(to) = from.offset(dir, dc) {
            if let Some(target) = board.get(to) {
                if target.color != piece.color {
                    moves.push(capture(from, to, piece, target));
                }
            }
        }
    }
}

fn step_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, dc) in offsets {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        match board.get(to) {
            None => moves.push(quiet(from, to, piece, MoveKind::Quiet)),
            Some(target) if target.color != piece.color => {
                moves.push(capture(from, to, piece, target))
            }
            Some(_) => {}
        }
    }
}

fn ray_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, dc) in directions {
        let mut cursor = from;
        while let Some(to) = cursor.offset(dr, dc) {
            match board.get(to) {
                None => moves.push(quiet(from, to, piece, MoveKind::Quiet)),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(capture(from, to, piece, target));
                    }
                    break;
                }
            }
            cursor = to;
        }
    }
}

#[inline]
fn quiet(from: Square, to: Square, piece: Piece, kind: MoveKind) -> Move {
    Move {
        from,
        to,
        piece,
        captured: None,
        kind,
    }
}

#[inline]
fn capture(from: Square, to: Square, piece: Piece, target: Piece) -> Move {
    Move {
        from,
        to,
        piece,
        captured: Some(target),
        kind: MoveKind::Capture,
    }
}

// ========== Terminal Check ==========

/// How a game ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// One king has been taken off the board.
    KingCaptured { winner: Color },
    /// The side to move has no move at all.
    NoMoves { side: Color },
}

impl Outcome {
    /// The winning side, if the outcome has one. Running out of moves is
    /// scored like stalemate, so `NoMoves` has no winner.
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::KingCaptured { winner } => Some(winner),
            Outcome::NoMoves { .. } => None,
        }
    }
}

/// Check whether the position is terminal with `to_move` about to play.
///
/// A missing king ends the game. Otherwise the game ends when `to_move` has
/// no move. Checkmate and stalemate are not distinguished from ordinary
/// positions.
pub fn outcome(board: &Board, to_move: Color) -> Option<Outcome> {
    match (board.king(Color::White), board.king(Color::Black)) {
        (Some(_), None) => {
            return Some(Outcome::KingCaptured {
                winner: Color::White,
            })
        }
        (None, Some(_)) => {
            return Some(Outcome::KingCaptured {
                winner: Color::Black,
            })
        }
        _ => {}
    }

    if all_moves(board, to_move).is_empty() {
        Some(Outcome::NoMoves { side: to_move })
    } else {
        None
    }
}
