//! Chess rules for the session engine: board, move generation, move
//! application and a one-ply opponent.
//!
//! # Coordinates
//!
//! ```text
//! Squares are (row, col), both 0-7. Row 0 is rank 8, row 7 is rank 1.
//! Col 0 is file a, col 7 is file h.
//!
//!        a  b  c  d  e  f  g  h
//!   8  (0,0)                (0,7)    black back rank
//!   7  (1,*)                         black pawns
//!   ...
//!   2  (6,*)                         white pawns
//!   1  (7,0)                (7,7)    white back rank
//! ```
//!
//! # Piece Codes
//!
//! ```text
//! One character per piece. Uppercase = White, lowercase = Black.
//!   P/p pawn   N/n knight   B/b bishop   R/r rook   Q/q queen   K/k king
//! An empty square is the empty string in board snapshots.
//! ```
//!
//! The rules are pseudo-legal: there is no check detection, castling,
//! en passant or promotion.

pub mod board;
pub mod executor;
pub mod movegen;
pub mod opponent;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use board::{Board, BoardCodeError};
pub use executor::{apply, notation, AppliedMove, CapturedLedger};
pub use movegen::{all_moves, legal_destinations, outcome, Outcome};
pub use opponent::{choose_move, Difficulty};

/// Side identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Get the other side.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step for this side.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row this side's pawns start on.
    #[inline]
    pub fn pawn_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Lowercase identifier used in snapshots ("white" / "black").
    pub fn id(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// Parse an identifier produced by [`Color::id`].
    pub fn from_id(id: &str) -> Option<Color> {
        match id {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Piece kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Uppercase letter for this kind.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// Parse a letter in either case.
    pub fn from_letter(letter: char) -> Option<PieceKind> {
        match letter.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// A colored piece. Pieces have no identity beyond the square they stand on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// Single-character code: uppercase for White, lowercase for Black.
    pub fn code(self) -> char {
        let letter = self.kind.letter();
        match self.color {
            Color::White => letter,
            Color::Black => letter.to_ascii_lowercase(),
        }
    }

    /// Parse a code produced by [`Piece::code`].
    ///
    /// This is the only place letter case carries meaning.
    pub fn from_code(code: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(code)?;
        let color = if code.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { color, kind })
    }

    /// Unicode chess glyph.
    pub fn glyph(self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::King) => '♔',
            (Color::White, PieceKind::Queen) => '♕',
            (Color::White, PieceKind::Rook) => '♖',
            (Color::White, PieceKind::Bishop) => '♗',
            (Color::White, PieceKind::Knight) => '♘',
            (Color::White, PieceKind::Pawn) => '♙',
            (Color::Black, PieceKind::King) => '♚',
            (Color::Black, PieceKind::Queen) => '♛',
            (Color::Black, PieceKind::Rook) => '♜',
            (Color::Black, PieceKind::Bishop) => '♝',
            (Color::Black, PieceKind::Knight) => '♞',
            (Color::Black, PieceKind::Pawn) => '♟',
        }
    }
}

impl From<Piece> for String {
    fn from(piece: Piece) -> String {
        piece.code().to_string()
    }
}

impl TryFrom<String> for Piece {
    type Error = BoardCodeError;

    fn try_from(code: String) -> Result<Piece, BoardCodeError> {
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Piece::from_code(c).ok_or(BoardCodeError::UnknownPiece(code)),
            _ => Err(BoardCodeError::UnknownPiece(code)),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A board square.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSquare")]
pub struct Square {
    row: u8,
    col: u8,
}

/// Unvalidated square coordinates as they arrive from a client.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RawSquare {
    pub row: i32,
    pub col: i32,
}

impl Square {
    /// Create a square from trusted coordinates.
    ///
    /// Panics if either coordinate is outside 0-7.
    #[inline]
    pub fn at(row: u8, col: u8) -> Square {
        assert!(row < 8 && col < 8, "square ({row}, {col}) is off the board");
        Square { row, col }
    }

    /// Create a square from untrusted coordinates.
    /// Returns None if the coordinates are off the board.
    #[inline]
    pub fn new(row: i32, col: i32) -> Option<Square> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.col
    }

    /// Square shifted by (dr, dc), or None if that leaves the board.
    #[inline]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        Square::new(self.row as i32 + dr as i32, self.col as i32 + dc as i32)
    }

    /// File letter, 'a' for col 0.
    pub fn file(self) -> char {
        (b'a' + self.col) as char
    }

    /// Rank number, 8 for row 0.
    pub fn rank(self) -> u8 {
        8 - self.row
    }

    /// Parse algebraic square names such as "e4".
    pub fn from_algebraic(name: &str) -> Option<Square> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        if col < 8 && (1..=8).contains(&rank) {
            Some(Square { row: 8 - rank, col })
        } else {
            None
        }
    }

    /// Iterate over all 64 squares, row-major.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }
}

impl From<Square> for RawSquare {
    fn from(square: Square) -> RawSquare {
        RawSquare {
            row: square.row as i32,
            col: square.col as i32,
        }
    }
}

impl TryFrom<RawSquare> for Square {
    type Error = String;

    fn try_from(raw: RawSquare) -> Result<Square, String> {
        Square::new(raw.row, raw.col)
            .ok_or_else(|| format!("square ({}, {}) is off the board", raw.row, raw.col))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

/// Classification of a generated destination.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Quiet,
    DoubleStep,
    Capture,
}

/// A move produced by the generator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    #[serde(rename = "move_type")]
    pub kind: MoveKind,
}

impl Move {
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.kind == MoveKind::Capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn test_color_ids() {
        assert_eq!(Color::from_id("white"), Some(Color::White));
        assert_eq!(Color::from_id("black"), Some(Color::Black));
        assert_eq!(Color::from_id("White"), None);
        assert_eq!(Color::from_id("red"), None);
    }

    #[test]
    fn test_piece_codes() {
        for code in "PNBRQKpnbrqk".chars() {
            let piece = Piece::from_code(code).unwrap();
            assert_eq!(piece.code(), code);
        }
        assert_eq!(
            Piece::from_code('n'),
            Some(Piece::new(Color::Black, PieceKind::Knight))
        );
        assert_eq!(Piece::from_code('x'), None);
        assert_eq!(Piece::from_code(' '), None);
    }

    #[test]
    fn test_piece_serde() {
        let piece = Piece::new(Color::White, PieceKind::Queen);
        assert_eq!(serde_json::to_string(&piece).unwrap(), "\"Q\"");
        let back: Piece = serde_json::from_str("\"q\"").unwrap();
        assert_eq!(back, Piece::new(Color::Black, PieceKind::Queen));
        assert!(serde_json::from_str::<Piece>("\"qq\"").is_err());
    }

    #[test]
    fn test_square_bounds() {
        assert!(Square::new(0, 0).is_some());
        assert!(Square::new(7, 7).is_some());
        assert!(Square::new(-1, 0).is_none());
        assert!(Square::new(0, 8).is_none());
        assert!(Square::new(8, 3).is_none());
    }

    #[test]
    #[should_panic]
    fn test_square_at_off_board_panics() {
        Square::at(8, 0);
    }

    #[test]
    fn test_square_algebraic() {
        let e2 = Square::at(6, 4);
        assert_eq!(e2.to_string(), "e2");
        assert_eq!(Square::from_algebraic("e2"), Some(e2));
        assert_eq!(Square::from_algebraic("a8"), Some(Square::at(0, 0)));
        assert_eq!(Square::from_algebraic("h1"), Some(Square::at(7, 7)));
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic("a0"), None);
    }

    #[test]
    fn test_square_offset() {
        let a1 = Square::at(7, 0);
        assert_eq!(a1.offset(-1, 0), Some(Square::at(6, 0)));
        assert_eq!(a1.offset(1, 0), None);
        assert_eq!(a1.offset(0, -1), None);
    }

    #[test]
    fn test_square_all() {
        let squares: Vec<_> = Square::all().collect();
        assert_eq!(squares.len(), 64);
        assert_eq!(squares[0], Square::at(0, 0));
        assert_eq!(squares[63], Square::at(7, 7));
    }

    #[test]
    fn test_square_serde_rejects_off_board() {
        let sq: Square = serde_json::from_str(r#"{"row":4,"col":4}"#).unwrap();
        assert_eq!(sq, Square::at(4, 4));
        assert!(serde_json::from_str::<Square>(r#"{"row":9,"col":4}"#).is_err());
    }
}
