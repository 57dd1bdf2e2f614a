//! Pure tic-tac-toe match logic.
//!
//! - [`Board`]: N×N grid with placement, win and full-board checks
//! - [`Match`]: two-player state machine with per-slot observed flags
//! - [`rules`]: line scanning shared by the board
//!
//! Nothing here does I/O or locking; the server wraps each [`Match`] in
//! its own critical section.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod error;
mod game;
pub mod rules;
mod state;
mod types;

pub use board::Board;
pub use error::{MatchError, MoveRejection};
pub use game::Match;
pub use rules::check_winner;
pub use state::MatchState;
pub use types::{Cell, Mark, MatchId, PlayerId, Slot};
