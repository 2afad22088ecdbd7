//! Chess sessions against an automated opponent.
//!
//! Each user walks through a short setup (difficulty, then color), then plays
//! moves that are validated against the board. After every accepted human
//! move the opponent replies, either from the background worker after a
//! short delay or when the client asks for it.
//!
//! ```text
//! setup ──► difficulty ──► color ──► playing ◄──► paused
//!                                       │
//!                                       ▼
//!                                   finished
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod worker;

pub use archive::{Archive, ArchivedGame};
pub use config::Config;
pub use error::{IllegalReason, SessionError, SessionResult};
pub use routes::router;
pub use session::{GameSession, GameState, OpponentTurn, SessionConfig, SessionManager, UserId};
