//! JSON request and response models.

use serde::{Deserialize, Serialize};

use chess_core::{AppliedMove, Board, CapturedLedger, Color, Difficulty, MoveKind, Outcome, Piece, RawSquare, Square};

use crate::session::GameState;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DifficultyRequest {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
pub struct ColorRequest {
    pub color: String,
}

/// Coordinates are not validated on the way in; off-board squares are
/// rejected as illegal moves.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MoveRequest {
    pub from: RawSquare,
    pub to: RawSquare,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SquareQuery {
    pub row: i32,
    pub col: i32,
}

// =============================================================================
// Setup
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DifficultyModel {
    pub id: &'static str,
    pub name: &'static str,
    pub level: u8,
    pub description: &'static str,
}

impl From<Difficulty> for DifficultyModel {
    fn from(d: Difficulty) -> Self {
        DifficultyModel {
            id: d.id(),
            name: d.display_name(),
            level: d.level(),
            description: d.description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColorModel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub pieces: &'static str,
}

impl ColorModel {
    pub fn options() -> Vec<ColorModel> {
        vec![
            ColorModel {
                id: "white",
                name: "White",
                description: "You move first",
                pieces: "♔♕♖♗♘♙",
            },
            ColorModel {
                id: "black",
                name: "Black",
                description: "The classic choice",
                pieces: "♚♛♜♝♞♟",
            },
        ]
    }
}

/// Next step of the setup dialogue.
#[derive(Debug, Serialize)]
#[serde(tag = "setup_step", rename_all = "snake_case")]
pub enum SetupResponse {
    Difficulty {
        message: String,
        difficulties: Vec<DifficultyModel>,
    },
    Color {
        message: String,
        colors: Vec<ColorModel>,
    },
}

// =============================================================================
// Game Snapshots
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GameModel {
    pub game_id: String,
    pub player_color: Color,
    pub difficulty: Difficulty,
    pub state: GameState,
    pub current_turn: Color,
    pub moves_count: usize,
    pub ai_thinking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedModel {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
}

impl From<&CapturedLedger> for CapturedModel {
    fn from(ledger: &CapturedLedger) -> Self {
        CapturedModel {
            white: ledger.of(Color::White).to_vec(),
            black: ledger.of(Color::Black).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardModel {
    /// 8×8 piece codes, "" for an empty square.
    pub board: Vec<Vec<String>>,
    pub current_turn: Color,
    pub player_color: Color,
    pub last_move: Option<AppliedMove>,
    pub captured: CapturedModel,
    pub rendered: String,
}

impl BoardModel {
    pub fn new(
        board: &Board,
        current_turn: Color,
        player_color: Color,
        last_move: Option<AppliedMove>,
        captured: &CapturedLedger,
    ) -> Self {
        BoardModel {
            board: board.to_codes(),
            current_turn,
            player_color,
            last_move,
            captured: captured.into(),
            rendered: board.render(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game: GameModel,
    pub board_data: BoardModel,
}

// =============================================================================
// Operation Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: String,
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub message: String,
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
    pub last_move: AppliedMove,
}

#[derive(Debug, Serialize)]
pub struct OpponentResponse {
    pub message: String,
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
    pub ai_move: AppliedMove,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DestinationModel {
    pub row: u8,
    pub col: u8,
    pub move_type: MoveKind,
}

#[derive(Debug, Default, Serialize)]
pub struct PossibleMovesResponse {
    pub possible_moves: Vec<DestinationModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece: Option<Piece>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Square>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub has_game: bool,
    #[serde(flatten)]
    pub snapshot: Option<GameSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthModel {
    pub status: String,
}
