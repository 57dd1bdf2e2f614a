//! Per-match critical section and long-poll turn notification.
//!
//! Each [`SharedMatch`] guards its [`Match`] with its own mutex and pairs
//! it with a [`Notify`]. Operations that clear an observed flag wake every
//! waiter on that match; waiters recheck their own slot and go back to
//! sleep if nothing changed for them. The mutex is never held across an
//! `.await`.

use derive_new::new;
use polled_tictactoe::{Board, Match, MatchError, MatchId, MatchState, PlayerId, Slot};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Point-in-time copy of a match as seen by one caller.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Snapshot {
    /// Board at the time of the snapshot.
    pub board: Board,
    /// State at the time of the snapshot.
    pub state: MatchState,
}

impl Snapshot {
    fn of(game: &Match) -> Self {
        Self::new(game.board().clone(), game.state())
    }
}

/// Outcome of a caller visiting the match page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Caller's slot, or `None` if they are not a participant.
    pub slot: Option<Slot>,
    /// Identity allocated for a caller who arrived without one and joined.
    pub issued: Option<PlayerId>,
}

/// A match shared between request handlers.
#[derive(Debug)]
pub struct SharedMatch {
    id: MatchId,
    game: Mutex<Match>,
    wake: Notify,
}

impl SharedMatch {
    /// Wraps a freshly created match.
    pub fn new(game: Match) -> Self {
        Self {
            id: game.id(),
            game: Mutex::new(game),
            wake: Notify::new(),
        }
    }

    /// Match identifier.
    pub fn id(&self) -> MatchId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Match> {
        // operations validate before mutating, so a poisoned guard still
        // holds a consistent match
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` inside the match's critical section.
    pub fn with<R>(&self, f: impl FnOnce(&Match) -> R) -> R {
        f(&self.lock())
    }

    /// Current board and state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.lock())
    }

    /// Slot held by `identity`, if any.
    pub fn slot_of(&self, identity: PlayerId) -> Option<Slot> {
        self.lock().slot_of(identity)
    }

    /// Joins `identity` as the second player and wakes slot A's waiter.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn join(&self, identity: PlayerId) -> Result<(), MatchError> {
        self.lock().join(identity)?;
        self.wake.notify_waiters();
        Ok(())
    }

    /// Admits a visitor to the match page.
    ///
    /// A visitor who is not the creator takes the free second slot,
    /// receiving a fresh identity from `allocate` if they have none. If no
    /// identity can be allocated the visitor is turned away. Anyone else is
    /// resolved to their existing slot, if any.
    #[instrument(skip(self, allocate), fields(match_id = %self.id))]
    pub fn admit(
        &self,
        caller: Option<PlayerId>,
        allocate: impl FnOnce() -> Option<PlayerId>,
    ) -> Admission {
        let mut game = self.lock();
        let open = game.state() == MatchState::Waiting && game.player_b().is_none();

        if open && caller != Some(game.player_a()) {
            let (identity, issued) = match caller {
                Some(id) => (id, None),
                None => match allocate() {
                    Some(id) => (id, Some(id)),
                    None => {
                        return Admission {
                            slot: None,
                            issued: None,
                        };
                    }
                },
            };
            if game.join(identity).is_ok() {
                drop(game);
                self.wake.notify_waiters();
                return Admission {
                    slot: Some(Slot::B),
                    issued,
                };
            }
            return Admission { slot: None, issued };
        }

        Admission {
            slot: caller.and_then(|id| game.slot_of(id)),
            issued: None,
        }
    }

    /// Attempts a move and wakes both slots' waiters on success.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn attempt_move(&self, identity: PlayerId, x: i64, y: i64) -> Result<MatchState, MatchError> {
        let state = self.lock().attempt_move(identity, x, y)?;
        self.wake.notify_waiters();
        Ok(state)
    }

    /// Blocks until `slot` has an unobserved update or `timeout` elapses.
    ///
    /// Returns immediately when an update is already pending. On timeout the
    /// stalled match is forfeited and the resulting state counts as the
    /// update. Either way the slot is marked as having observed the returned
    /// snapshot.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub async fn await_update(&self, slot: Slot, timeout: Duration) -> Snapshot {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            // register before checking so a wakeup between check and await
            // is not lost
            notified.as_mut().enable();

            {
                let mut game = self.lock();
                if !game.has_observed(slot) {
                    game.mark_observed(slot);
                    debug!(state = %game.state(), "Update delivered");
                    return Snapshot::of(&game);
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let mut game = self.lock();
                info!(?timeout, state = %game.state(), "Long-poll timed out");
                game.expire_if_stale();
                game.mark_observed(slot);
                return Snapshot::of(&game);
            }
            debug!("Woken, rechecking");
        }
    }
}
