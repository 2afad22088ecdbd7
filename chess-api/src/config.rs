//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::session::SessionConfig;

/// Chess session server.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess-api", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "CHESS_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// SQLite file for archiving ended games. Games are not archived if unset.
    #[arg(long, env = "CHESS_ARCHIVE")]
    pub archive: Option<PathBuf>,

    /// Delay before a scheduled opponent reply is played.
    #[arg(long, env = "CHESS_OPPONENT_DELAY_MS", default_value_t = 500)]
    pub opponent_delay_ms: u64,

    /// Upper bound on computing one opponent reply.
    #[arg(long, env = "CHESS_OPPONENT_TIMEOUT_MS", default_value_t = 2000)]
    pub opponent_timeout_ms: u64,

    /// Only play opponent replies when a client asks for them.
    #[arg(long, env = "CHESS_MANUAL_OPPONENT")]
    pub manual_opponent: bool,

    /// Seed for reproducible opponent play.
    #[arg(long, env = "CHESS_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            opponent_timeout: Duration::from_millis(self.opponent_timeout_ms),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["chess-api"]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.opponent_delay(), Duration::from_millis(500));
        assert_eq!(config.session().opponent_timeout, Duration::from_millis(2000));
        assert!(!config.manual_opponent);
        assert!(config.archive.is_none());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "chess-api",
            "--bind",
            "127.0.0.1:9000",
            "--manual-opponent",
            "--seed",
            "42",
            "--archive",
            "games.db",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert!(config.manual_opponent);
        assert_eq!(config.session().seed, Some(42));
        assert_eq!(config.archive, Some(PathBuf::from("games.db")));
    }

    #[test]
    fn test_rejects_bad_address() {
        assert!(Config::try_parse_from(["chess-api", "--bind", "nowhere"]).is_err());
    }
}
