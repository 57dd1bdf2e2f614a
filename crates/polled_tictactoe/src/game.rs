//! Match state machine.
//!
//! A [`Match`] owns its board, both player identities and the per-slot
//! "observed" flags used by long-poll waiters. Every mutation goes through
//! [`Match::join`], [`Match::attempt_move`] or [`Match::expire_if_stale`];
//! a failed operation leaves the match untouched.

use crate::board::Board;
use crate::error::{MatchError, MoveRejection};
use crate::state::MatchState;
use crate::types::{MatchId, PlayerId, Slot};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// One game between two identified players.
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    player_a: PlayerId,
    player_b: Option<PlayerId>,
    board: Board,
    state: MatchState,
    // true = slot has seen the current state
    observed: [bool; 2],
    finished_at: Option<Instant>,
}

impl Match {
    /// Creates a match in `Waiting` owned by `owner`.
    #[instrument(fields(match_id = %id, owner = %owner))]
    pub fn new(id: MatchId, owner: PlayerId, board_size: usize) -> Self {
        info!(board_size, "Creating match");
        Self {
            id,
            player_a: owner,
            player_b: None,
            board: Board::new(board_size),
            state: MatchState::Waiting,
            observed: [false, false],
            finished_at: None,
        }
    }

    /// Match identifier.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Creator's identity.
    pub fn player_a(&self) -> PlayerId {
        self.player_a
    }

    /// Joiner's identity, once joined.
    pub fn player_b(&self) -> Option<PlayerId> {
        self.player_b
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MatchState {
        self.state
    }

    /// True once the match has a winner or is tied.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// When the match reached a terminal state.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Slot held by `identity`, if it is a participant.
    pub fn slot_of(&self, identity: PlayerId) -> Option<Slot> {
        if identity == self.player_a {
            Some(Slot::A)
        } else if Some(identity) == self.player_b {
            Some(Slot::B)
        } else {
            None
        }
    }

    /// Whether `slot` has already observed the current state.
    pub fn has_observed(&self, slot: Slot) -> bool {
        self.observed[slot.index()]
    }

    /// Records that `slot` has seen the current state.
    pub fn mark_observed(&mut self, slot: Slot) {
        self.observed[slot.index()] = true;
    }

    /// Joins `identity` as the second player.
    ///
    /// On success slot A's observed flag is cleared so a blocked waiter on
    /// the creator wakes to see the opponent arrive.
    ///
    /// # Errors
    ///
    /// `SelfJoin` when `identity` created the match, `MatchFull` when the
    /// match is no longer waiting for a second player.
    #[instrument(skip(self), fields(match_id = %self.id, identity = %identity))]
    pub fn join(&mut self, identity: PlayerId) -> Result<(), MatchError> {
        if identity == self.player_a {
            debug!("Creator tried to join own match");
            return Err(MatchError::SelfJoin);
        }
        if self.state != MatchState::Waiting || self.player_b.is_some() {
            debug!(state = %self.state, "Match not accepting players");
            return Err(MatchError::MatchFull);
        }

        self.player_b = Some(identity);
        self.state = MatchState::PlayerATurn;
        self.observed[Slot::A.index()] = false;
        info!("Second player joined");
        Ok(())
    }

    /// Plays `identity`'s mark at `(x, y)`.
    ///
    /// On success the state advances to the next turn, a win, or a tie, and
    /// both observed flags are cleared. Returns the new state.
    ///
    /// # Errors
    ///
    /// `InvalidMove` when the match is over, it is not the caller's turn, or
    /// the cell is off the board or occupied. Nothing changes on error.
    #[instrument(skip(self), fields(match_id = %self.id, identity = %identity))]
    pub fn attempt_move(
        &mut self,
        identity: PlayerId,
        x: i64,
        y: i64,
    ) -> Result<MatchState, MatchError> {
        if self.is_terminal() {
            warn!(state = %self.state, "Move after match ended");
            return Err(MoveRejection::GameOver.into());
        }

        let slot = match (self.slot_of(identity), self.state.to_move()) {
            (Some(slot), Some(turn)) if slot == turn => slot,
            (slot, turn) => {
                warn!(?slot, ?turn, "Move out of turn");
                return Err(MoveRejection::WrongTurn.into());
            }
        };

        let (Ok(col), Ok(row)) = (usize::try_from(x), usize::try_from(y)) else {
            warn!(x, y, "Negative coordinates");
            return Err(MoveRejection::OutOfBounds(x, y).into());
        };
        self.board.place(col, row, slot.mark()).map_err(|rejection| {
            warn!(%rejection, "Move rejected by board");
            MatchError::InvalidMove(rejection)
        })?;

        self.state = if let Some(winner) = self.board.winner() {
            MatchState::win_for_mark(winner)
        } else if self.board.is_full() {
            MatchState::Tie
        } else {
            MatchState::turn_of(slot.other())
        };
        if self.is_terminal() {
            self.finished_at = Some(Instant::now());
        }
        self.observed = [false, false];

        info!(x, y, state = %self.state, "Move accepted");
        Ok(self.state)
    }

    /// Ends a stalled match by forfeit.
    ///
    /// `Waiting` and `PlayerBTurn` become `PlayerAWin`; `PlayerATurn`
    /// becomes `PlayerBWin`. Terminal matches are left alone.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn expire_if_stale(&mut self) {
        let forfeit = match self.state {
            MatchState::Waiting | MatchState::PlayerBTurn => MatchState::PlayerAWin,
            MatchState::PlayerATurn => MatchState::PlayerBWin,
            _ => return,
        };
        info!(from = %self.state, to = %forfeit, "Match stalled, forfeiting");
        self.state = forfeit;
        self.finished_at = Some(Instant::now());
    }
}
