//! Per-user game sessions.
//!
//! The [`SessionManager`] is the only owner of game state. Each user has one
//! slot behind an async mutex, and every operation holds that lock for its
//! whole duration, so a human move and the opponent reply for the same user
//! never interleave. Different users never contend. A slot exists only while
//! its user has a game or a pending setup.
//!
//! An opponent reply is a two-phase operation: the human move marks the
//! session as awaiting the opponent and schedules an [`OpponentTurn`]; the
//! reply is computed later by [`SessionManager::resolve_scheduled`] (or on
//! demand by [`SessionManager::resolve_opponent_move`]).

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use chess_core::{
    apply, choose_move, legal_destinations, outcome, AppliedMove, Board, CapturedLedger, Color,
    Difficulty, Move, Outcome, RawSquare, Square,
};

use crate::archive::{Archive, ArchivedGame};
use crate::error::{IllegalReason, SessionError, SessionResult};
use crate::models::{
    BoardModel, ColorModel, DestinationModel, GameModel, GameSnapshot, MessageResponse,
    MoveResponse, OpponentResponse, PossibleMovesResponse, SetupResponse, StartResponse,
    StatusResponse,
};

pub type UserId = u64;

type MoveSelector = Arc<dyn Fn(&Board, Color, u8, &mut StdRng) -> Option<Move> + Send + Sync>;

const OPPONENT_COMMENTS: [&str; 7] = [
    "Interesting move! Every piece has its value.",
    "Good tactics. Think through every step.",
    "A classic idea. I studied this position at the chess club.",
    "Not bad, comrade! But remember, attack is not everything.",
    "As my old coach used to say: chess is a war on 64 squares.",
    "I see you are thinking strategically. That is the right approach.",
    "Precise and measured. An engineer's move.",
];

/// Lifecycle of a game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Setup,
    Playing,
    Paused,
    Finished,
}

impl GameState {
    pub fn id(self) -> &'static str {
        match self {
            GameState::Setup => "setup",
            GameState::Playing => "playing",
            GameState::Paused => "paused",
            GameState::Finished => "finished",
        }
    }
}

/// A game between one user and the automated opponent.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub user_id: UserId,
    pub game_id: String,
    pub player_color: Color,
    pub difficulty: Difficulty,
    pub state: GameState,
    pub board: Board,
    pub history: Vec<AppliedMove>,
    pub current_turn: Color,
    /// Set while an opponent reply is pending.
    pub ai_thinking: bool,
    pub captured: CapturedLedger,
    pub outcome: Option<Outcome>,
    /// Token of the scheduled reply allowed to resolve this game.
    scheduled_turn: Option<u64>,
}

impl GameSession {
    fn new(user_id: UserId, game_id: String, player_color: Color, difficulty: Difficulty) -> Self {
        GameSession {
            user_id,
            game_id,
            player_color,
            difficulty,
            state: GameState::Playing,
            board: Board::starting(),
            history: Vec::new(),
            current_turn: Color::White,
            ai_thinking: false,
            captured: CapturedLedger::new(),
            outcome: None,
            scheduled_turn: None,
        }
    }

    pub fn opponent_color(&self) -> Color {
        self.player_color.opponent()
    }

    /// Apply a generated move, record it, pass the turn and check for the end.
    fn play(&mut self, mov: Move) -> AppliedMove {
        let applied = apply(&mut self.board, &mut self.captured, mov);
        self.history.push(applied.clone());
        self.current_turn = self.current_turn.opponent();

        if let Some(result) = outcome(&self.board, self.current_turn) {
            info!(user_id = self.user_id, game_id = %self.game_id, ?result, "game finished");
            self.state = GameState::Finished;
            self.outcome = Some(result);
        }
        applied
    }

    fn finish(&mut self, result: Outcome) {
        info!(user_id = self.user_id, game_id = %self.game_id, ?result, "game finished");
        self.state = GameState::Finished;
        self.outcome = Some(result);
        self.ai_thinking = false;
        self.scheduled_turn = None;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game: GameModel {
                game_id: self.game_id.clone(),
                player_color: self.player_color,
                difficulty: self.difficulty,
                state: self.state,
                current_turn: self.current_turn,
                moves_count: self.history.len(),
                ai_thinking: self.ai_thinking,
                outcome: self.outcome,
            },
            board_data: BoardModel::new(
                &self.board,
                self.current_turn,
                self.player_color,
                self.history.last().cloned(),
                &self.captured,
            ),
        }
    }

    fn finished_message(&self) -> String {
        match self.outcome.and_then(Outcome::winner) {
            Some(winner) if winner == self.player_color => "Game over: you win!".to_string(),
            Some(_) => "Game over: the opponent wins.".to_string(),
            None => "Game over.".to_string(),
        }
    }
}

/// Difficulty chosen during setup, waiting for a color.
#[derive(Debug, Clone, Copy, Default)]
struct PendingSetup {
    difficulty: Option<Difficulty>,
}

#[derive(Debug, Default)]
struct UserSlot {
    pending: Option<PendingSetup>,
    game: Option<GameSession>,
    /// Set when the slot has been removed from the map. Whoever locks a
    /// retired slot must look the user up again.
    retired: bool,
}

impl UserSlot {
    fn is_vacant(&self) -> bool {
        self.pending.is_none() && self.game.is_none()
    }
}

/// A locked, registered user slot.
///
/// Dropping the guard unregisters the slot if it holds neither a game nor a
/// pending setup. Removal happens under both the map lock and the slot lock,
/// so a live slot is always the one in the map.
struct SlotGuard<'a> {
    manager: &'a SessionManager,
    user: UserId,
    slot: OwnedMutexGuard<UserSlot>,
}

impl Deref for SlotGuard<'_> {
    type Target = UserSlot;

    fn deref(&self) -> &UserSlot {
        &self.slot
    }
}

impl DerefMut for SlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut UserSlot {
        &mut self.slot
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.slot.is_vacant() {
            let mut slots = self.manager.registry();
            slots.remove(&self.user);
            self.slot.retired = true;
        }
    }
}

/// An opponent reply waiting to be computed.
///
/// `token` identifies this particular scheduling; a reply scheduled again
/// (after a resume, or for a later move) makes older tokens stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentTurn {
    pub user_id: UserId,
    pub game_id: String,
    pub token: u64,
}

/// Session manager settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on one opponent computation.
    pub opponent_timeout: Duration,
    /// Seed for reproducible opponent play; random if None.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            opponent_timeout: Duration::from_millis(2000),
            seed: None,
        }
    }
}

/// Owner of every user's pending setup and game.
pub struct SessionManager {
    slots: Mutex<HashMap<UserId, Arc<AsyncMutex<UserSlot>>>>,
    rng: Mutex<StdRng>,
    selector: MoveSelector,
    opponent_timeout: Duration,
    archive: Option<Archive>,
    scheduler: Option<mpsc::UnboundedSender<OpponentTurn>>,
    next_turn: AtomicU64,
}

impl SessionManager {
    /// Create a manager.
    ///
    /// With a `scheduler`, every pending opponent reply is sent there for a
    /// worker to resolve. Without one, replies must be requested with
    /// [`SessionManager::resolve_opponent_move`].
    pub fn new(
        config: SessionConfig,
        archive: Option<Archive>,
        scheduler: Option<mpsc::UnboundedSender<OpponentTurn>>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        SessionManager {
            slots: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
            selector: Arc::new(choose_move::<StdRng>),
            opponent_timeout: config.opponent_timeout,
            archive,
            scheduler,
            next_turn: AtomicU64::new(1),
        }
    }

    /// Replace the opponent's move selector.
    #[cfg(test)]
    pub(crate) fn with_selector(
        mut self,
        selector: impl Fn(&Board, Color, u8, &mut StdRng) -> Option<Move> + Send + Sync + 'static,
    ) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<UserId, Arc<AsyncMutex<UserSlot>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the user's slot, registering an empty one if there is none.
    async fn slot(&self, user: UserId) -> SlotGuard<'_> {
        loop {
            let slot = self.registry().entry(user).or_default().clone();
            if let Some(guard) = self.lock_live(user, slot).await {
                return guard;
            }
        }
    }

    /// Lock the user's slot if one is registered. Never registers a slot.
    async fn existing_slot(&self, user: UserId) -> Option<SlotGuard<'_>> {
        loop {
            let slot = self.registry().get(&user)?.clone();
            if let Some(guard) = self.lock_live(user, slot).await {
                return Some(guard);
            }
        }
    }

    async fn lock_live(
        &self,
        user: UserId,
        slot: Arc<AsyncMutex<UserSlot>>,
    ) -> Option<SlotGuard<'_>> {
        let slot = slot.lock_owned().await;
        if slot.retired {
            return None;
        }
        Some(SlotGuard {
            manager: self,
            user,
            slot,
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    fn schedule(&self, game: &mut GameSession) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        let token = self.next_turn.fetch_add(1, Ordering::Relaxed);
        game.scheduled_turn = Some(token);
        let turn = OpponentTurn {
            user_id: game.user_id,
            game_id: game.game_id.clone(),
            token,
        };
        if scheduler.send(turn).is_err() {
            warn!(user_id = game.user_id, "opponent worker is gone; reply must be requested");
        }
    }

    // ========== Setup ==========

    /// Start the setup dialogue and list the difficulties.
    pub async fn begin_setup(&self, user: UserId) -> SetupResponse {
        let mut slot = self.slot(user).await;
        slot.pending = Some(PendingSetup::default());
        debug!(user_id = user, "setup started");

        SetupResponse::Difficulty {
            message: "New game setup: choose a difficulty.".to_string(),
            difficulties: Difficulty::all().map(Into::into).collect(),
        }
    }

    /// Record the difficulty and list the colors.
    pub async fn choose_difficulty(
        &self,
        user: UserId,
        difficulty_id: &str,
    ) -> SessionResult<SetupResponse> {
        let difficulty = Difficulty::from_id(difficulty_id)
            .ok_or_else(|| SessionError::InvalidDifficulty(difficulty_id.to_string()))?;

        let mut slot = self.slot(user).await;
        slot.pending = Some(PendingSetup {
            difficulty: Some(difficulty),
        });
        debug!(user_id = user, difficulty = difficulty.id(), "difficulty chosen");

        Ok(SetupResponse::Color {
            message: format!("Difficulty: {}. Choose your color.", difficulty.display_name()),
            colors: ColorModel::options(),
        })
    }

    /// Create the game once both difficulty and color are known.
    pub async fn choose_color_and_start(
        &self,
        user: UserId,
        color_id: &str,
    ) -> SessionResult<StartResponse> {
        let mut slot = self
            .existing_slot(user)
            .await
            .ok_or(SessionError::SetupIncomplete)?;

        if slot.game.is_some() {
            return Err(SessionError::GameInProgress);
        }
        let difficulty = slot
            .pending
            .and_then(|p| p.difficulty)
            .ok_or(SessionError::SetupIncomplete)?;
        let color = Color::from_id(color_id.trim())
            .ok_or_else(|| SessionError::InvalidColor(color_id.to_string()))?;

        let game_id = format!(
            "game_{}_{}",
            user,
            self.with_rng(|rng| rng.random_range(1000..10000))
        );
        let mut game = GameSession::new(user, game_id, color, difficulty);
        slot.pending = None;

        let message = if game.current_turn == color {
            format!(
                "Game started. Difficulty: {}. You play {}. Your move!",
                difficulty.display_name(),
                color
            )
        } else {
            game.ai_thinking = true;
            self.schedule(&mut game);
            format!(
                "Game started. Difficulty: {}. You play {}. The opponent moves first...",
                difficulty.display_name(),
                color
            )
        };
        info!(user_id = user, game_id = %game.game_id, color = color.id(), difficulty = difficulty.id(), "game started");

        let snapshot = game.snapshot();
        slot.game = Some(game);
        Ok(StartResponse { message, snapshot })
    }

    // ========== Play ==========

    /// Validate and play the human's move, then hand the turn to the opponent.
    pub async fn submit_human_move(
        &self,
        user: UserId,
        from: RawSquare,
        to: RawSquare,
    ) -> SessionResult<MoveResponse> {
        let mut slot = self
            .existing_slot(user)
            .await
            .ok_or(SessionError::NoSuchGame)?;
        let game = slot.game.as_mut().ok_or(SessionError::NoSuchGame)?;

        if game.state != GameState::Playing {
            return Err(SessionError::GameNotActive);
        }
        if game.ai_thinking || game.current_turn != game.player_color {
            return Err(SessionError::TurnError);
        }

        let mov = validate_human_move(game, from, to)?;
        let applied = game.play(mov);
        debug!(user_id = user, notation = %applied.notation, "human move");

        let message = if game.state == GameState::Finished {
            game.finished_message()
        } else {
            game.ai_thinking = true;
            self.schedule(game);
            "Move accepted. The opponent is thinking...".to_string()
        };

        Ok(MoveResponse {
            message,
            snapshot: game.snapshot(),
            last_move: applied,
        })
    }

    /// Compute and play the pending opponent reply for the user's current game.
    pub async fn resolve_opponent_move(&self, user: UserId) -> SessionResult<OpponentResponse> {
        self.resolve(user, None).await
    }

    /// Compute and play a scheduled opponent reply.
    ///
    /// Fails with `NoSuchGame` if the game it was scheduled for has been
    /// ended or replaced in the meantime, and with `TurnError` if the reply
    /// was already played or scheduled again since.
    pub async fn resolve_scheduled(&self, turn: &OpponentTurn) -> SessionResult<OpponentResponse> {
        self.resolve(turn.user_id, Some(turn)).await
    }

    async fn resolve(
        &self,
        user: UserId,
        scheduled: Option<&OpponentTurn>,
    ) -> SessionResult<OpponentResponse> {
        let mut slot = self
            .existing_slot(user)
            .await
            .ok_or(SessionError::NoSuchGame)?;
        let game = slot.game.as_mut().ok_or(SessionError::NoSuchGame)?;

        if let Some(turn) = scheduled {
            if turn.game_id != game.game_id {
                return Err(SessionError::NoSuchGame);
            }
            if game.scheduled_turn != Some(turn.token) {
                return Err(SessionError::TurnError);
            }
        }
        if game.state != GameState::Playing {
            return Err(SessionError::GameNotActive);
        }
        if !game.ai_thinking {
            return Err(SessionError::TurnError);
        }

        let board = game.board;
        let color = game.opponent_color();
        let level = game.difficulty.level();
        let seed: u64 = self.with_rng(|rng| rng.random());
        let selector = Arc::clone(&self.selector);
        let search = tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            selector(&board, color, level, &mut rng)
        });

        let timeout_ms = self.opponent_timeout.as_millis() as u64;
        let choice = match tokio::time::timeout(self.opponent_timeout, search).await {
            Ok(Ok(choice)) => choice,
            Ok(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Ok(Err(_)) | Err(_) => {
                warn!(user_id = user, game_id = %game.game_id, timeout_ms, "opponent timed out");
                return Err(SessionError::OpponentTimeout(timeout_ms));
            }
        };

        game.ai_thinking = false;
        game.scheduled_turn = None;
        let Some(mov) = choice else {
            game.finish(Outcome::NoMoves { side: color });
            return Err(SessionError::NoLegalMove);
        };

        let applied = game.play(mov);
        debug!(user_id = user, notation = %applied.notation, "opponent move");

        let comment = self.with_rng(|rng| {
            OPPONENT_COMMENTS
                .choose(rng)
                .map(|c| c.to_string())
                .unwrap_or_default()
        });
        let message = if game.state == GameState::Finished {
            format!("Opponent played {}. {}", applied.notation, game.finished_message())
        } else {
            format!("Opponent played {}. Your move!", applied.notation)
        };

        Ok(OpponentResponse {
            message,
            snapshot: game.snapshot(),
            ai_move: applied,
            comment,
        })
    }

    /// Destinations for one of the human's pieces. Anything else yields an
    /// empty list.
    pub async fn possible_moves(&self, user: UserId, row: i32, col: i32) -> PossibleMovesResponse {
        let Some(slot) = self.existing_slot(user).await else {
            return PossibleMovesResponse::default();
        };
        let Some(game) = slot.game.as_ref() else {
            return PossibleMovesResponse::default();
        };
        let Some(from) = Square::new(row, col) else {
            return PossibleMovesResponse::default();
        };
        let Some(piece) = game.board.get(from).filter(|p| p.color == game.player_color) else {
            return PossibleMovesResponse::default();
        };

        PossibleMovesResponse {
            possible_moves: legal_destinations(&game.board, from)
                .into_iter()
                .map(|m| DestinationModel {
                    row: m.to.row(),
                    col: m.to.col(),
                    move_type: m.kind,
                })
                .collect(),
            piece: Some(piece),
            from: Some(from),
        }
    }

    // ========== Lifecycle ==========

    pub async fn pause_game(&self, user: UserId) -> SessionResult<StartResponse> {
        let mut slot = self
            .existing_slot(user)
            .await
            .ok_or(SessionError::NoSuchGame)?;
        let game = slot.game.as_mut().ok_or(SessionError::NoSuchGame)?;
        if game.state != GameState::Playing {
            return Err(SessionError::GameNotActive);
        }
        game.state = GameState::Paused;
        info!(user_id = user, game_id = %game.game_id, "game paused");

        Ok(StartResponse {
            message: "Game paused.".to_string(),
            snapshot: game.snapshot(),
        })
    }

    /// Resume a paused game. A reply that was pending when the game was
    /// paused is scheduled again.
    pub async fn resume_game(&self, user: UserId) -> SessionResult<StartResponse> {
        let mut slot = self
            .existing_slot(user)
            .await
            .ok_or(SessionError::NoSuchGame)?;
        let game = slot.game.as_mut().ok_or(SessionError::NoSuchGame)?;
        if game.state != GameState::Paused {
            return Err(SessionError::GameNotActive);
        }
        game.state = GameState::Playing;
        info!(user_id = user, game_id = %game.game_id, "game resumed");

        let message = if game.ai_thinking {
            self.schedule(game);
            "Game resumed. The opponent is thinking...".to_string()
        } else {
            "Game resumed. Your move!".to_string()
        };
        Ok(StartResponse {
            message,
            snapshot: game.snapshot(),
        })
    }

    /// Delete the user's game and any pending setup. Never fails.
    pub async fn end_game(&self, user: UserId) -> MessageResponse {
        let no_game = || MessageResponse {
            message: "No active game found.".to_string(),
        };
        let Some(mut slot) = self.existing_slot(user).await else {
            return no_game();
        };
        slot.pending = None;

        let Some(game) = slot.game.take() else {
            return no_game();
        };
        info!(user_id = user, game_id = %game.game_id, moves = game.history.len(), "game ended");

        if let Some(archive) = &self.archive {
            if let Err(err) = archive.record(user, &ArchivedGame::from_session(&game)) {
                warn!(user_id = user, game_id = %game.game_id, %err, "failed to archive game");
            }
        }

        MessageResponse {
            message: "Game ended.".to_string(),
        }
    }

    pub async fn get_status(&self, user: UserId) -> StatusResponse {
        let snapshot = match self.existing_slot(user).await {
            Some(slot) => slot.game.as_ref().map(GameSession::snapshot),
            None => None,
        };
        StatusResponse {
            has_game: snapshot.is_some(),
            snapshot,
        }
    }

    /// Archived games of a user, newest first. Empty without an archive.
    pub fn history(&self, user: UserId) -> SessionResult<Vec<ArchivedGame>> {
        match &self.archive {
            Some(archive) => Ok(archive.games_for(user)?),
            None => Ok(Vec::new()),
        }
    }
}

fn validate_human_move(game: &GameSession, from: RawSquare, to: RawSquare) -> SessionResult<Move> {
    let illegal = |reason| SessionError::IllegalMove { reason };

    let from = Square::new(from.row, from.col).ok_or(illegal(IllegalReason::OffBoard))?;
    let to = Square::new(to.row, to.col).ok_or(illegal(IllegalReason::OffBoard))?;
    let piece = game
        .board
        .get(from)
        .ok_or(illegal(IllegalReason::EmptySource))?;
    if piece.color != game.player_color {
        return Err(illegal(IllegalReason::NotYourPiece));
    }

    legal_destinations(&game.board, from)
        .into_iter()
        .find(|m| m.to == to)
        .ok_or(illegal(IllegalReason::Unreachable))
}
