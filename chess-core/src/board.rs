//! 8×8 board of optional pieces.

use thiserror::Error;

use crate::{Color, Piece, PieceKind, Square};

/// Errors from parsing a board out of piece codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardCodeError {
    /// The outer array did not have 8 rows.
    #[error("expected 8 rows, got {0}")]
    RowCount(usize),

    /// A row did not have 8 cells.
    #[error("row {row} has {len} cells, expected 8")]
    RowLength { row: usize, len: usize },

    /// A cell held something other than a piece code or "".
    #[error("unknown piece code {0:?}")]
    UnknownPiece(String),
}

/// Board state. A plain value: `clone()` (or a copy) is a deep copy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    const BACK_RANK: [PieceKind; 8] = [
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
    ];

    /// Create a board with no pieces.
    #[inline]
    pub fn empty() -> Board {
        Board {
            cells: [[None; 8]; 8],
        }
    }

    /// Create the standard starting position.
    pub fn starting() -> Board {
        let mut board = Board::empty();
        for col in 0..8u8 {
            let kind = Self::BACK_RANK[col as usize];
            board.set(Square::at(0, col), Some(Piece::new(Color::Black, kind)));
            board.set(Square::at(1, col), Some(Piece::new(Color::Black, PieceKind::Pawn)));
            board.set(Square::at(6, col), Some(Piece::new(Color::White, PieceKind::Pawn)));
            board.set(Square::at(7, col), Some(Piece::new(Color::White, kind)));
        }
        board
    }

    /// Get the piece on a square.
    #[inline]
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.row() as usize][square.col() as usize]
    }

    /// Put a piece on (or clear) a square.
    #[inline]
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.row() as usize][square.col() as usize] = piece;
    }

    /// Take the piece off a square, leaving it empty.
    #[inline]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.cells[square.row() as usize][square.col() as usize].take()
    }

    #[inline]
    pub fn is_empty(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    /// Iterate over occupied squares, row-major.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Find the king of a color, if it is still on the board.
    pub fn king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Snapshot as an 8×8 array of piece codes ("" for an empty square).
    pub fn to_codes(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(|p| p.code().to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Parse an array produced by [`Board::to_codes`].
    pub fn from_codes<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Board, BoardCodeError> {
        if rows.len() != 8 {
            return Err(BoardCodeError::RowCount(rows.len()));
        }
        let mut board = Board::empty();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != 8 {
                return Err(BoardCodeError::RowLength { row: r, len: row.len() });
            }
            for (c, cell) in row.iter().enumerate() {
                let cell = cell.as_ref();
                if cell.is_empty() {
                    continue;
                }
                let mut chars = cell.chars();
                let piece = match (chars.next(), chars.next()) {
                    (Some(code), None) => Piece::from_code(code),
                    _ => None,
                }
                .ok_or_else(|| BoardCodeError::UnknownPiece(cell.to_string()))?;
                board.set(Square::at(r as u8, c as u8), Some(piece));
            }
        }
        Ok(board)
    }

    /// Text diagram with Unicode glyphs, rank 8 at the top.
    ///
    /// ```text
    /// 8 ♜ ♞ ♝ ♛ ♚ ♝ ♞ ♜
    /// 7 ♟ ♟ ♟ ♟ ♟ ♟ ♟ ♟
    /// 6 · · · · · · · ·
    /// ...
    ///   a b c d e f g h
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(8 * 20);
        for (r, row) in self.cells.iter().enumerate() {
            out.push_str(&(8 - r).to_string());
            for cell in row {
                out.push(' ');
                out.push(cell.map(Piece::glyph).unwrap_or('·'));
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h");
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}
