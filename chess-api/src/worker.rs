//! Background resolution of scheduled opponent replies.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::session::{OpponentTurn, SessionManager};

/// Extra attempts for a scheduled reply that timed out.
const TIMEOUT_RETRIES: u32 = 1;

/// Spawn the worker that plays each scheduled reply after `delay`.
///
/// Replies run concurrently; per-user ordering comes from the session lock.
/// The worker stops when every sender is dropped or the manager is gone.
pub fn spawn(
    manager: Weak<SessionManager>,
    mut turns: mpsc::UnboundedReceiver<OpponentTurn>,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(turn) = turns.recv().await {
            let manager = manager.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(manager) = manager.upgrade() else {
                    return;
                };
                resolve(&manager, &turn).await;
            });
        }
        info!("opponent worker stopped");
    })
}

async fn resolve(manager: &SessionManager, turn: &OpponentTurn) {
    let mut retries = 0;
    loop {
        match manager.resolve_scheduled(turn).await {
            Ok(reply) => {
                debug!(user_id = turn.user_id, game_id = %turn.game_id, notation = %reply.ai_move.notation, "scheduled reply played");
            }
            // The reply is still pending after a timeout.
            Err(SessionError::OpponentTimeout(_)) if retries < TIMEOUT_RETRIES => {
                retries += 1;
                debug!(user_id = turn.user_id, game_id = %turn.game_id, retries, "retrying timed out reply");
                continue;
            }
            // The game was ended, replaced or paused, or the reply was
            // played or scheduled again while this one waited.
            Err(SessionError::NoSuchGame | SessionError::GameNotActive | SessionError::TurnError) => {
                debug!(user_id = turn.user_id, game_id = %turn.game_id, "scheduled reply dropped");
            }
            Err(err) => {
                warn!(user_id = turn.user_id, game_id = %turn.game_id, %err, "scheduled reply failed; it must be requested");
            }
        }
        return;
    }
}
