//! WASM bindings for chess-core
//!
//! Exposes the move-legality contract to a browser front end (board display,
//! move hints, puzzle checking).

use wasm_bindgen::prelude::*;

use crate::{apply, legal_destinations, outcome, Board, CapturedLedger, Color, Square};

/// WASM-friendly wrapper around Board
#[wasm_bindgen]
pub struct WasmBoard {
    inner: Board,
    captured: CapturedLedger,
}

#[wasm_bindgen]
impl WasmBoard {
    /// Create a board in the starting position
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmBoard {
        WasmBoard {
            inner: Board::starting(),
            captured: CapturedLedger::new(),
        }
    }

    /// Create a board from an 8×8 array of piece codes
    #[wasm_bindgen(js_name = fromCodes)]
    pub fn from_codes(codes: JsValue) -> Result<WasmBoard, JsError> {
        let rows: Vec<Vec<String>> = serde_wasm_bindgen::from_value(codes)?;
        let inner = Board::from_codes(&rows)?;
        Ok(WasmBoard {
            inner,
            captured: CapturedLedger::new(),
        })
    }

    /// Get the board as an 8×8 array of piece codes
    pub fn codes(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.to_codes())?)
    }

    /// Piece code on a square, or "" if empty or off the board
    #[wasm_bindgen(js_name = pieceAt)]
    pub fn piece_at(&self, row: i32, col: i32) -> String {
        Square::new(row, col)
            .and_then(|sq| self.inner.get(sq))
            .map(|p| p.code().to_string())
            .unwrap_or_default()
    }

    /// Legal destinations for the piece on (row, col) as JSON
    /// Each entry is { row, col, move_type }
    #[wasm_bindgen(js_name = legalDestinations)]
    pub fn legal_destinations(&self, row: i32, col: i32) -> Result<JsValue, JsError> {
        let moves: Vec<WasmDestination> = Square::new(row, col)
            .map(|from| legal_destinations(&self.inner, from))
            .unwrap_or_default()
            .into_iter()
            .map(|m| WasmDestination {
                row: m.to.row(),
                col: m.to.col(),
                move_type: m.kind,
            })
            .collect();
        Ok(serde_wasm_bindgen::to_value(&moves)?)
    }

    /// Apply a move if it is legal. Returns its notation, or undefined if illegal.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(
        &mut self,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Option<String> {
        let from = Square::new(from_row, from_col)?;
        let to = Square::new(to_row, to_col)?;
        let mov = legal_destinations(&self.inner, from)
            .into_iter()
            .find(|m| m.to == to)?;
        Some(apply(&mut self.inner, &mut self.captured, mov).notation)
    }

    /// Captured piece codes of one color ("white" or "black")
    pub fn captured(&self, color: &str) -> Vec<String> {
        Color::from_id(color)
            .map(|c| {
                self.captured
                    .of(c)
                    .iter()
                    .map(|p| p.code().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Winner id once a king is gone, else undefined (also when `to_move` has
    /// no move, which has no winner)
    pub fn winner(&self, to_move: &str) -> Option<String> {
        let to_move = Color::from_id(to_move)?;
        outcome(&self.inner, to_move)
            .and_then(|o| o.winner())
            .map(|c| c.id().to_string())
    }

    /// Unicode text diagram
    pub fn render(&self) -> String {
        self.inner.render()
    }

    /// Clone the board
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_board(&self) -> WasmBoard {
        WasmBoard {
            inner: self.inner,
            captured: self.captured.clone(),
        }
    }
}

impl Default for WasmBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable destination for JavaScript
#[derive(serde::Serialize)]
struct WasmDestination {
    row: u8,
    col: u8,
    move_type: crate::MoveKind,
}
