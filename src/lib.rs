//! Polled Games library - tic-tac-toe matches over HTTP long-polling
//!
//! Players create a match, share its link, and exchange moves through plain
//! GET requests. Each browser keeps a `/wait_for_update` request open; the
//! server releases it when the opponent joins or moves, or forfeits the
//! stalled side once the long-poll times out.
//!
//! # Architecture
//!
//! - **Registry**: process-wide map of matches with random unique ids
//! - **Notifier**: per-match lock plus wakeup used by long-poll waiters
//! - **Identity**: cookie-carried player ids that are never reissued
//! - **Server**: axum routes over an [`AppState`] built once at startup
//!
//! # Example
//!
//! ```no_run
//! use polled_games::{AppState, ServerConfig, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let app = router(AppState::new(ServerConfig::default())?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assets;
mod config;
mod identity;
mod notifier;
mod registry;
mod server;

// Crate-level exports - Configuration
pub use config::{ConfigError, HOST_ENV, PORT_ENV, ServerConfig};

// Crate-level exports - Identity
pub use identity::{COOKIE_NAME, IdentityAllocator, player_id_from_headers, set_cookie_header};

// Crate-level exports - Matches and long-polling
pub use notifier::{Admission, SharedMatch, Snapshot};
pub use registry::{IdsExhausted, MatchRegistry};

// Crate-level exports - HTTP server
pub use server::{AppState, GameStateResponse, router, serve, spawn_eviction};

// Crate-level exports - Game types
pub use polled_tictactoe::{
    Board, Cell, Mark, Match, MatchError, MatchId, MatchState, MoveRejection, PlayerId, Slot,
};
