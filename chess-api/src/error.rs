//! Session errors and their HTTP mapping.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a submitted move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalReason {
    OffBoard,
    EmptySource,
    NotYourPiece,
    Unreachable,
}

impl fmt::Display for IllegalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IllegalReason::OffBoard => "move leaves the board",
            IllegalReason::EmptySource => "no piece on the source square",
            IllegalReason::NotYourPiece => "that is not your piece",
            IllegalReason::Unreachable => "that piece cannot move there",
        })
    }
}

/// Errors returned by session operations. All are recoverable.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no game found")]
    NoSuchGame,

    #[error("the game is not active")]
    GameNotActive,

    #[error("it is not your turn")]
    TurnError,

    #[error("illegal move: {reason}")]
    IllegalMove { reason: IllegalReason },

    #[error("choose a difficulty first")]
    SetupIncomplete,

    #[error("unknown difficulty {0:?}")]
    InvalidDifficulty(String),

    #[error("unknown color {0:?}")]
    InvalidColor(String),

    #[error("a game is already in progress; end it first")]
    GameInProgress,

    #[error("the opponent has no legal move")]
    NoLegalMove,

    #[error("the opponent did not answer within {0} ms")]
    OpponentTimeout(u64),

    #[error("game archive error: {0}")]
    Archive(#[from] rusqlite::Error),
}

impl SessionError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NoSuchGame => "no_such_game",
            SessionError::GameNotActive => "game_not_active",
            SessionError::TurnError => "turn_error",
            SessionError::IllegalMove { .. } => "illegal_move",
            SessionError::SetupIncomplete => "setup_incomplete",
            SessionError::InvalidDifficulty(_) => "invalid_difficulty",
            SessionError::InvalidColor(_) => "invalid_color",
            SessionError::GameInProgress => "game_in_progress",
            SessionError::NoLegalMove => "no_legal_move",
            SessionError::OpponentTimeout(_) => "opponent_timeout",
            SessionError::Archive(_) => "archive",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::NoSuchGame => StatusCode::NOT_FOUND,
            SessionError::IllegalMove { .. }
            | SessionError::InvalidDifficulty(_)
            | SessionError::InvalidColor(_) => StatusCode::BAD_REQUEST,
            SessionError::GameNotActive
            | SessionError::TurnError
            | SessionError::SetupIncomplete
            | SessionError::GameInProgress
            | SessionError::NoLegalMove => StatusCode::CONFLICT,
            SessionError::OpponentTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SessionError::Archive(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Serialize)]
struct ErrorModel {
    code: &'static str,
    detail: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let body = ErrorModel {
            code: self.code(),
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
