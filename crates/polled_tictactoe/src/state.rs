//! Match lifecycle states.

use crate::types::{Mark, Slot};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a match.
///
/// `Waiting` → `PlayerATurn` ⇄ `PlayerBTurn` → one of the terminal states.
/// Terminal states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum MatchState {
    /// Only the creator is present.
    #[display("WAITING")]
    #[serde(rename = "WAITING")]
    Waiting,
    /// Slot A is to move.
    #[display("PLAYER_A_TURN")]
    #[serde(rename = "PLAYER_A_TURN")]
    PlayerATurn,
    /// Slot B is to move.
    #[display("PLAYER_B_TURN")]
    #[serde(rename = "PLAYER_B_TURN")]
    PlayerBTurn,
    /// Slot A won, by line or by forfeit.
    #[display("PLAYER_A_WIN")]
    #[serde(rename = "PLAYER_A_WIN")]
    PlayerAWin,
    /// Slot B won, by line or by forfeit.
    #[display("PLAYER_B_WIN")]
    #[serde(rename = "PLAYER_B_WIN")]
    PlayerBWin,
    /// Board filled with no winner.
    #[display("TIE")]
    #[serde(rename = "TIE")]
    Tie,
}

impl MatchState {
    /// True for win and tie states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchState::PlayerAWin | MatchState::PlayerBWin | MatchState::Tie
        )
    }

    /// Slot whose move is legal, if any.
    pub fn to_move(self) -> Option<Slot> {
        match self {
            MatchState::PlayerATurn => Some(Slot::A),
            MatchState::PlayerBTurn => Some(Slot::B),
            _ => None,
        }
    }

    /// Turn state for `slot`.
    pub fn turn_of(slot: Slot) -> Self {
        match slot {
            Slot::A => MatchState::PlayerATurn,
            Slot::B => MatchState::PlayerBTurn,
        }
    }

    /// Win state for `slot`.
    pub fn win_for(slot: Slot) -> Self {
        match slot {
            Slot::A => MatchState::PlayerAWin,
            Slot::B => MatchState::PlayerBWin,
        }
    }

    /// Win state for the slot owning `mark`.
    pub fn win_for_mark(mark: Mark) -> Self {
        Self::win_for(Slot::of_mark(mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchState::PlayerATurn).unwrap(),
            "\"PLAYER_A_TURN\""
        );
        assert_eq!(MatchState::Tie.to_string(), "TIE");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MatchState::Waiting.is_terminal());
        assert!(!MatchState::PlayerBTurn.is_terminal());
        assert!(MatchState::PlayerAWin.is_terminal());
        assert!(MatchState::Tie.is_terminal());
    }

    #[test]
    fn test_turn_and_win_states_per_slot() {
        use strum::IntoEnumIterator;
        for slot in Slot::iter() {
            assert_eq!(MatchState::turn_of(slot).to_move(), Some(slot));
            assert!(MatchState::win_for(slot).is_terminal());
            assert_eq!(MatchState::win_for_mark(slot.mark()), MatchState::win_for(slot));
            assert_ne!(MatchState::turn_of(slot), MatchState::turn_of(slot.other()));
        }
    }

    #[test]
    fn test_to_move() {
        assert_eq!(MatchState::Waiting.to_move(), None);
        assert_eq!(MatchState::PlayerBTurn.to_move(), Some(Slot::B));
        assert_eq!(MatchState::PlayerAWin.to_move(), None);
    }
}
