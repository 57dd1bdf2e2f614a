//! Process-wide match registry.

use crate::notifier::SharedMatch;
use derive_more::{Display, Error};
use polled_tictactoe::{Match, MatchId, PlayerId};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Upper bound (inclusive) for randomly drawn match and player ids.
pub(crate) const MAX_ID: u64 = 10_000_000;

/// Every id in the drawable range has already been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("all {} ids are in use", capacity)]
pub struct IdsExhausted {
    /// Size of the id range.
    pub capacity: u64,
}

/// Draws an id in `1..=capacity` that `taken` does not yet hold and
/// records it.
pub(crate) fn draw_unique<T>(
    taken: &mut HashSet<T>,
    capacity: u64,
    wrap: impl Fn(u64) -> T,
) -> Result<T, IdsExhausted>
where
    T: Copy + Eq + std::hash::Hash + std::fmt::Display,
{
    if taken.len() as u64 >= capacity {
        return Err(IdsExhausted { capacity });
    }
    let mut rng = rand::thread_rng();
    loop {
        let candidate = wrap(rng.gen_range(1..=capacity));
        if taken.insert(candidate) {
            return Ok(candidate);
        }
        debug!(%candidate, "Id collision, redrawing");
    }
}

#[derive(Debug)]
struct Inner {
    matches: HashMap<MatchId, Arc<SharedMatch>>,
    // never shrinks, so evicted ids are not reissued
    issued: HashSet<MatchId>,
    capacity: u64,
}

/// Concurrency-safe map from match id to match.
///
/// The registry lock covers only lookup, insertion and removal. It is never
/// held while a match is locked; callers mutate a match through its own
/// [`SharedMatch`] operations.
#[derive(Debug, Clone)]
pub struct MatchRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_ID)
    }
}

impl MatchRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating match registry");
        Self::default()
    }

    /// Creates an empty registry drawing ids from `1..=capacity`.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                matches: HashMap::new(),
                issued: HashSet::new(),
                capacity,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a waiting match owned by `owner` and returns its id.
    ///
    /// # Errors
    ///
    /// [`IdsExhausted`] once every id in the range has been issued.
    #[instrument(skip(self), fields(owner = %owner))]
    pub fn create(&self, owner: PlayerId, board_size: usize) -> Result<MatchId, IdsExhausted> {
        let mut inner = self.lock();
        let capacity = inner.capacity;
        let id = draw_unique(&mut inner.issued, capacity, MatchId).inspect_err(|e| {
            warn!(error = %e, "Cannot create match");
        })?;

        let shared = Arc::new(SharedMatch::new(Match::new(id, owner, board_size)));
        inner.matches.insert(id, shared);
        info!(match_id = %id, total = inner.matches.len(), "Registered match");
        Ok(id)
    }

    /// Looks up a match.
    pub fn get(&self, id: MatchId) -> Option<Arc<SharedMatch>> {
        let found = self.lock().matches.get(&id).cloned();
        if found.is_none() {
            debug!(match_id = %id, "Match not found");
        }
        found
    }

    /// Number of live matches.
    pub fn len(&self) -> usize {
        self.lock().matches.len()
    }

    /// True when no match is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes matches that finished more than `retention` before `now`.
    ///
    /// Match state is read without the registry lock held. Their ids stay
    /// reserved. Returns how many were removed.
    #[instrument(skip(self))]
    pub fn evict_finished(&self, now: Instant, retention: Duration) -> usize {
        let candidates: Vec<(MatchId, Arc<SharedMatch>)> = self
            .lock()
            .matches
            .iter()
            .map(|(id, shared)| (*id, Arc::clone(shared)))
            .collect();

        let expired: Vec<MatchId> = candidates
            .into_iter()
            .filter(|(_, shared)| {
                shared
                    .with(|game| game.finished_at())
                    .is_some_and(|finished| now.saturating_duration_since(finished) > retention)
            })
            .map(|(id, _)| id)
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut inner = self.lock();
        let evicted = expired
            .iter()
            .filter(|id| inner.matches.remove(id).is_some())
            .count();
        info!(evicted, remaining = inner.matches.len(), "Evicted finished matches");
        evicted
    }
}
