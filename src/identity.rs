//! Per-browser player identities carried in the `player_id` cookie.

use axum::http::{HeaderMap, HeaderValue, header};
use crate::registry::{IdsExhausted, MAX_ID, draw_unique};
use polled_tictactoe::PlayerId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, instrument, warn};

/// Cookie holding the caller's identity.
pub const COOKIE_NAME: &str = "player_id";

/// Issues process-unique player identities.
///
/// Only identities handed out here are recorded. A cookie a client makes
/// up is never added, so the set grows only with real allocations.
#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    issued: Arc<Mutex<HashSet<PlayerId>>>,
    capacity: u64,
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::with_capacity(MAX_ID)
    }
}

impl IdentityAllocator {
    /// Creates an allocator with no identities issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator drawing identities from `1..=capacity`.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            issued: Arc::new(Mutex::new(HashSet::new())),
            capacity,
        }
    }

    /// Draws a random identity not yet issued.
    ///
    /// # Errors
    ///
    /// [`IdsExhausted`] once every identity in the range has been issued.
    #[instrument(skip(self))]
    pub fn allocate(&self) -> Result<PlayerId, IdsExhausted> {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let id = draw_unique(&mut *issued, self.capacity, PlayerId).inspect_err(|e| {
            warn!(error = %e, "Cannot issue identity");
        })?;
        info!(player_id = %id, "Issued new identity");
        Ok(id)
    }

    /// Whether `id` was issued by this allocator.
    pub fn is_known(&self, id: PlayerId) -> bool {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Number of identities issued.
    pub fn len(&self) -> usize {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no identity has been issued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads the caller's identity from the `Cookie` header(s).
///
/// Missing, empty or non-numeric tokens count as absent.
pub fn player_id_from_headers(headers: &HeaderMap) -> Option<PlayerId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| value.trim().trim_matches('"').parse::<u64>().ok())
        .map(PlayerId)
}

/// `Set-Cookie` value assigning `id` to the browser.
pub fn set_cookie_header(id: PlayerId) -> HeaderValue {
    // digits and ASCII only, always a valid header value
    HeaderValue::from_str(&format!("{}={}; Path=/; SameSite=Lax", COOKIE_NAME, id))
        .unwrap_or_else(|_| HeaderValue::from_static("player_id=0; Path=/"))
}
