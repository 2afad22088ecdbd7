//! Chess session server.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chess_api::{router, worker, Archive, Config, SessionManager};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chess_api=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();

    let archive = match &config.archive {
        Some(path) => match Archive::open(path) {
            Ok(archive) => {
                info!(path = %path.display(), "archiving ended games");
                Some(archive)
            }
            Err(err) => {
                error!(path = %path.display(), %err, "failed to open game archive");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let manager = if config.manual_opponent {
        info!("opponent replies are played on request only");
        Arc::new(SessionManager::new(config.session(), archive, None))
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Arc::new(SessionManager::new(config.session(), archive, Some(tx)));
        worker::spawn(Arc::downgrade(&manager), rx, config.opponent_delay());
        manager
    };

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(bind = %config.bind, %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!("Chess API running on http://{}", config.bind);

    if let Err(err) = axum::serve(listener, router(manager)).await {
        error!(%err, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
