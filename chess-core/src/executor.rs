//! Move application, capture ledger and algebraic notation.

use serde::{Deserialize, Serialize};

use crate::{Board, Color, Move, MoveKind, Piece, PieceKind};

/// Pieces taken off the board, keyed by the color of the captured piece.
///
/// Both lists are append-only for the lifetime of a game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedLedger {
    white: Vec<Piece>,
    black: Vec<Piece>,
}

impl CapturedLedger {
    pub fn new() -> CapturedLedger {
        CapturedLedger::default()
    }

    /// Append a captured piece to its color's list.
    pub fn record(&mut self, piece: Piece) {
        match piece.color {
            Color::White => self.white.push(piece),
            Color::Black => self.black.push(piece),
        }
    }

    /// Captured pieces of the given color, oldest first.
    pub fn of(&self, color: Color) -> &[Piece] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn len(&self) -> usize {
        self.white.len() + self.black.len()
    }

    pub fn is_empty(&self) -> bool {
        self.white.is_empty() && self.black.is_empty()
    }
}

/// A move as it was played: the generated move with `captured` taken from
/// the board, plus its notation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    #[serde(flatten)]
    pub mov: Move,
    pub notation: String,
}

/// Apply a generated move to the board.
///
/// Moves the piece, clears the source and records whatever stood on the
/// destination in the ledger. Re-applying the same move is not supported.
///
/// Panics if the moving piece is not on the source square, which means the
/// move did not come from the generator for this board.
pub fn apply(board: &mut Board, ledger: &mut CapturedLedger, mov: Move) -> AppliedMove {
    let moving = board.take(mov.from);
    assert_eq!(
        moving,
        Some(mov.piece),
        "move {}{} does not match the board",
        mov.from,
        mov.to
    );

    let captured = board.get(mov.to);
    board.set(mov.to, Some(mov.piece));
    if let Some(piece) = captured {
        ledger.record(piece);
    }

    let mov = Move {
        captured,
        kind: if captured.is_some() {
            MoveKind::Capture
        } else {
            mov.kind
        },
        ..mov
    };

    AppliedMove {
        notation: notation(&mov),
        mov,
    }
}

/// Short algebraic notation without check marks.
///
/// Pawns: `e4`, `exd5`. Other pieces: `Nf3`, `Bxc6`.
pub fn notation(mov: &Move) -> String {
    let capture = mov.captured.is_some();
    let dest = mov.to.to_string();
    match (mov.piece.kind, capture) {
        (PieceKind::Pawn, true) => format!("{}x{}", mov.from.file(), dest),
        (PieceKind::Pawn, false) => dest,
        (kind, true) => format!("{}x{}", kind.letter(), dest),
        (kind, false) => format!("{}{}", kind.letter(), dest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{legal_destinations, Square};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn find(board: &Board, from: &str, to: &str) -> Move {
        legal_destinations(board, sq(from))
            .into_iter()
            .find(|m| m.to == sq(to))
            .unwrap()
    }

    #[test]
    fn test_ledger_keys_by_captured_color() {
        let mut ledger = CapturedLedger::new();
        assert!(ledger.is_empty());
        ledger.record(Piece::from_code('p').unwrap());
        ledger.record(Piece::from_code('Q').unwrap());
        ledger.record(Piece::from_code('n').unwrap());
        assert_eq!(ledger.len(), 3);
        assert_eq!(
            ledger.of(Color::Black),
            &[Piece::from_code('p').unwrap(), Piece::from_code('n').unwrap()]
        );
        assert_eq!(ledger.of(Color::White), &[Piece::from_code('Q').unwrap()]);
    }

    #[test]
    fn test_apply_quiet_move() {
        let mut board = Board::starting();
        let mut ledger = CapturedLedger::new();
        let mov = find(&board, "e2", "e4");
        let applied = apply(&mut board, &mut ledger, mov);

        assert_eq!(applied.mov.kind, MoveKind::DoubleStep);
        assert_eq!(applied.notation, "e4");
        assert!(board.is_empty(sq("e2")));
        assert_eq!(board.get(sq("e4")), Piece::from_code('P'));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_apply_capture() {
        let mut board = Board::empty();
        let mut ledger = CapturedLedger::new();
        board.set(sq("e4"), Piece::from_code('P'));
        board.set(sq("d5"), Piece::from_code('p'));
        let mov = find(&board, "e4", "d5");
        let applied = apply(&mut board, &mut ledger, mov);

        assert_eq!(applied.notation, "exd5");
        assert_eq!(applied.mov.captured, Piece::from_code('p'));
        assert_eq!(board.get(sq("d5")), Piece::from_code('P'));
        assert!(board.is_empty(sq("e4")));
        assert_eq!(ledger.of(Color::Black), &[Piece::from_code('p').unwrap()]);
        assert!(ledger.of(Color::White).is_empty());
    }

    #[test]
    fn test_apply_fills_capture_from_board() {
        // Opponent moves are built before the board is inspected for captures.
        let mut board = Board::empty();
        let mut ledger = CapturedLedger::new();
        board.set(sq("c3"), Piece::from_code('n'));
        board.set(sq("e2"), Piece::from_code('R'));
        let mov = Move {
            from: sq("c3"),
            to: sq("e2"),
            piece: Piece::from_code('n').unwrap(),
            captured: None,
            kind: MoveKind::Quiet,
        };
        let applied = apply(&mut board, &mut ledger, mov);
        assert_eq!(applied.mov.kind, MoveKind::Capture);
        assert_eq!(applied.notation, "Nxe2");
        assert_eq!(ledger.of(Color::White), &[Piece::from_code('R').unwrap()]);
    }

    #[test]
    fn test_piece_notation() {
        let mut board = Board::starting();
        let mut ledger = CapturedLedger::new();
        let mv = find(&board, "g1", "f3");
        let applied = apply(&mut board, &mut ledger, mv);
        assert_eq!(applied.notation, "Nf3");

        let mv = find(&board, "b8", "c6");
        let applied = apply(&mut board, &mut ledger, mv);
        assert_eq!(applied.notation, "Nc6");
    }

    #[test]
    #[should_panic]
    fn test_apply_rejects_foreign_move() {
        let mut board = Board::starting();
        let mut ledger = CapturedLedger::new();
        let mov = Move {
            from: sq("e4"),
            to: sq("e5"),
            piece: Piece::from_code('P').unwrap(),
            captured: None,
            kind: MoveKind::Quiet,
        };
        apply(&mut board, &mut ledger, mov);
    }
}
