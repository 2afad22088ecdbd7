//! SQLite-backed archive of ended games.

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::session::{GameSession, UserId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS games (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id      TEXT    NOT NULL,
    user_id      INTEGER NOT NULL,
    player_color TEXT    NOT NULL,
    difficulty   TEXT    NOT NULL,
    state        TEXT    NOT NULL,
    outcome      TEXT,
    moves        TEXT    NOT NULL,
    final_board  TEXT    NOT NULL,
    ended_at     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS games_by_user ON games (user_id, id);
";

/// One archived game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedGame {
    pub game_id: String,
    pub player_color: String,
    pub difficulty: String,
    pub state: String,
    /// JSON-encoded outcome, if the game reached one.
    pub outcome: Option<String>,
    /// Space-separated move notation, in play order.
    pub moves: String,
    /// JSON-encoded 8×8 piece codes.
    pub final_board: String,
    /// Seconds since the Unix epoch.
    pub ended_at: i64,
}

impl ArchivedGame {
    pub fn from_session(game: &GameSession) -> ArchivedGame {
        let moves: Vec<&str> = game.history.iter().map(|m| m.notation.as_str()).collect();
        let ended_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        ArchivedGame {
            game_id: game.game_id.clone(),
            player_color: game.player_color.id().to_string(),
            difficulty: game.difficulty.id().to_string(),
            state: game.state.id().to_string(),
            outcome: game
                .outcome
                .and_then(|o| serde_json::to_string(&o).ok()),
            moves: moves.join(" "),
            final_board: serde_json::to_string(&game.board.to_codes()).unwrap_or_default(),
            ended_at,
        }
    }
}

/// Archive of ended games, one row per game.
pub struct Archive {
    conn: Mutex<Connection>,
}

impl Archive {
    /// Open (or create) an archive file.
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open(path)?)
    }

    /// Open a throwaway archive.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Archive {
            conn: Mutex::new(conn),
        })
    }

    /// Store an ended game.
    pub fn record(&self, user_id: UserId, game: &ArchivedGame) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO games
                (game_id, user_id, player_color, difficulty, state, outcome, moves, final_board, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                game.game_id,
                user_id as i64,
                game.player_color,
                game.difficulty,
                game.state,
                game.outcome,
                game.moves,
                game.final_board,
                game.ended_at,
            ],
        )?;
        Ok(())
    }

    /// Archived games of a user, newest first.
    pub fn games_for(&self, user_id: UserId) -> Result<Vec<ArchivedGame>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT game_id, player_color, difficulty, state, outcome, moves, final_board, ended_at
             FROM games WHERE user_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([user_id as i64], |row| {
            Ok(ArchivedGame {
                game_id: row.get(0)?,
                player_color: row.get(1)?,
                difficulty: row.get(2)?,
                state: row.get(3)?,
                outcome: row.get(4)?,
                moves: row.get(5)?,
                final_board: row.get(6)?,
                ended_at: row.get(7)?,
            })
        })?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(game_id: &str, moves: &str) -> ArchivedGame {
        ArchivedGame {
            game_id: game_id.to_string(),
            player_color: "white".to_string(),
            difficulty: "easy".to_string(),
            state: "playing".to_string(),
            outcome: None,
            moves: moves.to_string(),
            final_board: "[]".to_string(),
            ended_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_record_and_list() {
        let archive = Archive::open_in_memory().unwrap();
        archive.record(7, &sample("game_7_1000", "e4 e5")).unwrap();
        archive.record(7, &sample("game_7_2000", "d4")).unwrap();
        archive.record(8, &sample("game_8_3000", "c4")).unwrap();

        let games = archive.games_for(7).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].game_id, "game_7_2000");
        assert_eq!(games[1], sample("game_7_1000", "e4 e5"));
        assert!(archive.games_for(9).unwrap().is_empty());
    }
}
