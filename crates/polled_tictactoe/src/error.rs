//! Errors returned by board and match operations.

use derive_more::{Display, Error};

/// Reason a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MoveRejection {
    /// The caller is not the player whose turn it is.
    #[display("not the caller's turn")]
    WrongTurn,

    /// The coordinates are outside the board.
    #[display("position ({}, {}) is off the board", _0, _1)]
    OutOfBounds(i64, i64),

    /// The target cell already holds a mark.
    #[display("position ({}, {}) is already occupied", _0, _1)]
    Occupied(usize, usize),

    /// The match has already ended.
    #[display("match is already over")]
    GameOver,
}

/// Error from a match operation. Failures never change match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MatchError {
    /// The move was refused; see the rejection for why.
    #[display("invalid move: {}", _0)]
    InvalidMove(#[error(not(source))] MoveRejection),

    /// The match already has two players or is no longer waiting.
    #[display("match is full")]
    MatchFull,

    /// The creator tried to join their own match.
    #[display("cannot join your own match")]
    SelfJoin,
}

impl From<MoveRejection> for MatchError {
    fn from(rejection: MoveRejection) -> Self {
        MatchError::InvalidMove(rejection)
    }
}
