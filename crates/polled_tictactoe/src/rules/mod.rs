//! Game rules for tic-tac-toe on an N×N board.
//!
//! Pure functions over [`Board`](crate::Board), kept apart from board
//! storage so the match state machine can compose them.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_winner, lines};
