//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::archive::ArchivedGame;
use crate::error::SessionResult;
use crate::models::{
    ColorRequest, DifficultyRequest, HealthModel, MessageResponse, MoveRequest, MoveResponse,
    OpponentResponse, PossibleMovesResponse, SetupResponse, SquareQuery, StartResponse,
    StatusResponse,
};
use crate::session::{SessionManager, UserId};

type AppState = Arc<SessionManager>;

// =============================================================================
// Setup
// =============================================================================

async fn begin_setup(State(state): State<AppState>, Path(user): Path<UserId>) -> Json<SetupResponse> {
    Json(state.begin_setup(user).await)
}

async fn choose_difficulty(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Json(req): Json<DifficultyRequest>,
) -> SessionResult<Json<SetupResponse>> {
    Ok(Json(state.choose_difficulty(user, &req.difficulty).await?))
}

async fn choose_color(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Json(req): Json<ColorRequest>,
) -> SessionResult<Json<StartResponse>> {
    Ok(Json(state.choose_color_and_start(user, &req.color).await?))
}

// =============================================================================
// Play
// =============================================================================

async fn make_move(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Json(req): Json<MoveRequest>,
) -> SessionResult<Json<MoveResponse>> {
    Ok(Json(state.submit_human_move(user, req.from, req.to).await?))
}

async fn opponent_move(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
) -> SessionResult<Json<OpponentResponse>> {
    Ok(Json(state.resolve_opponent_move(user).await?))
}

async fn possible_moves(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Query(square): Query<SquareQuery>,
) -> Json<PossibleMovesResponse> {
    Json(state.possible_moves(user, square.row, square.col).await)
}

// =============================================================================
// Lifecycle
// =============================================================================

async fn get_game(State(state): State<AppState>, Path(user): Path<UserId>) -> Json<StatusResponse> {
    Json(state.get_status(user).await)
}

async fn end_game(State(state): State<AppState>, Path(user): Path<UserId>) -> Json<MessageResponse> {
    Json(state.end_game(user).await)
}

async fn pause(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
) -> SessionResult<Json<StartResponse>> {
    Ok(Json(state.pause_game(user).await?))
}

async fn resume(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
) -> SessionResult<Json<StartResponse>> {
    Ok(Json(state.resume_game(user).await?))
}

async fn history(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
) -> SessionResult<Json<Vec<ArchivedGame>>> {
    Ok(Json(state.history(user)?))
}

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

/// Build the application router.
pub fn router(manager: Arc<SessionManager>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/users/{id}/setup", post(begin_setup))
        .route("/users/{id}/setup/difficulty", post(choose_difficulty))
        .route("/users/{id}/setup/color", post(choose_color))
        .route("/users/{id}/move", post(make_move))
        .route("/users/{id}/opponent", post(opponent_move))
        .route("/users/{id}/moves", get(possible_moves))
        .route("/users/{id}/game", get(get_game).delete(end_game))
        .route("/users/{id}/pause", post(pause))
        .route("/users/{id}/resume", post(resume))
        .route("/users/{id}/history", get(history))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(manager)
}
