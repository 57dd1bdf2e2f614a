//! Core domain types for tic-tac-toe matches.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Mark of the match creator (slot A).
    X,
    /// Mark of the joining player (slot B).
    O,
}

impl Mark {
    /// Returns the opponent's mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Single-character wire symbol.
    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'x',
            Mark::O => 'o',
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Empty cell.
    Empty,
    /// Cell occupied by a mark.
    Occupied(Mark),
}

impl Cell {
    /// Single-character wire symbol, `*` when empty.
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '*',
            Cell::Occupied(mark) => mark.symbol(),
        }
    }
}

/// A player's position within a match, independent of their identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Slot {
    /// The player who created the match and moves first.
    A,
    /// The player who joined the match.
    B,
}

impl Slot {
    /// Returns the other slot.
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Mark placed by this slot.
    pub fn mark(self) -> Mark {
        match self {
            Slot::A => Mark::X,
            Slot::B => Mark::O,
        }
    }

    /// Slot owning the given mark.
    pub fn of_mark(mark: Mark) -> Self {
        match mark {
            Mark::X => Slot::A,
            Mark::O => Slot::B,
        }
    }

    /// 1 for slot A, 2 for slot B.
    pub fn number(self) -> u8 {
        match self {
            Slot::A => 1,
            Slot::B => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// Opaque, process-unique identity of a client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct PlayerId(pub u64);

/// Unique identifier of a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct MatchId(pub u64);
