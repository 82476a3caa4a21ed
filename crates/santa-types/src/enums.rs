//! Enumeration types for the Secret Santa game.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Game lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a game.
///
/// ```text
///  REGISTRATION_OPEN <--toggle--> REGISTRATION_CLOSE
///          |                              |
///          +----------- shuffle ----------+
///                          |
///                          v
///                      ALLOCATED
/// ```
///
/// `Allocated` is terminal. Stored as a `SMALLINT` ordinal, see
/// [`GameState::ordinal`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// Players may join.
    #[default]
    RegistrationOpen,
    /// Joining is paused; the organizer may reopen it.
    RegistrationClose,
    /// Recipients have been assigned.
    Allocated,
}

impl GameState {
    /// Storage ordinal for this state.
    pub const fn ordinal(self) -> i16 {
        match self {
            Self::RegistrationOpen => 11,
            Self::RegistrationClose => 12,
            Self::Allocated => 13,
        }
    }

    /// Whether the game is still in one of the two pre-allocation states.
    ///
    /// Editable games may have their registration toggled, their details
    /// changed and their players shuffled.
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::RegistrationOpen | Self::RegistrationClose)
    }

    /// Whether new players may currently join.
    pub const fn is_open_for_registration(self) -> bool {
        matches!(self, Self::RegistrationOpen)
    }
}

impl core::fmt::Display for GameState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClose => "REGISTRATION_CLOSE",
            Self::Allocated => "ALLOCATED",
        };
        f.write_str(name)
    }
}

/// A stored state ordinal that maps to no [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown game state ordinal: {0}")]
pub struct UnknownGameState(pub i16);

impl TryFrom<i16> for GameState {
    type Error = UnknownGameState;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            11 => Ok(Self::RegistrationOpen),
            12 => Ok(Self::RegistrationClose),
            13 => Ok(Self::Allocated),
            other => Err(UnknownGameState(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted fields
// ---------------------------------------------------------------------------

/// A persisted field of the game aggregate.
///
/// The change-tracking envelope records these, and the persistence layer
/// maps each one to its column in the `games` table. Ordering follows
/// column order so generated statements are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameField {
    /// `games.state`
    State,
    /// `games.initiator_id`
    InitiatorId,
    /// `games.initiator_fullname`
    InitiatorFullname,
    /// `games.title`
    Title,
    /// `games.description`
    Description,
    /// `games.date_finish`
    DateFinish,
}

impl GameField {
    /// Every field, in column order.
    pub const ALL: [Self; 6] = [
        Self::State,
        Self::InitiatorId,
        Self::InitiatorFullname,
        Self::Title,
        Self::Description,
        Self::DateFinish,
    ];

    /// Column name in the `games` table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::InitiatorId => "initiator_id",
            Self::InitiatorFullname => "initiator_fullname",
            Self::Title => "title",
            Self::Description => "description",
            Self::DateFinish => "date_finish",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_roundtrip() {
        for state in [
            GameState::RegistrationOpen,
            GameState::RegistrationClose,
            GameState::Allocated,
        ] {
            assert_eq!(GameState::try_from(state.ordinal()), Ok(state));
        }
    }

    #[test]
    fn unknown_ordinal_is_rejected() {
        assert_eq!(GameState::try_from(0), Err(UnknownGameState(0)));
        assert_eq!(GameState::try_from(14), Err(UnknownGameState(14)));
    }

    #[test]
    fn only_pre_allocation_states_are_editable() {
        assert!(GameState::RegistrationOpen.is_editable());
        assert!(GameState::RegistrationClose.is_editable());
        assert!(!GameState::Allocated.is_editable());
    }

    #[test]
    fn only_open_state_accepts_players() {
        assert!(GameState::RegistrationOpen.is_open_for_registration());
        assert!(!GameState::RegistrationClose.is_open_for_registration());
        assert!(!GameState::Allocated.is_open_for_registration());
    }

    #[test]
    fn state_serializes_in_screaming_case() {
        let json = serde_json::to_string(&GameState::RegistrationClose).ok();
        assert_eq!(json.as_deref(), Some("\"REGISTRATION_CLOSE\""));
    }

    #[test]
    fn columns_are_unique() {
        let mut columns: Vec<&str> = GameField::ALL.iter().map(|f| f.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), GameField::ALL.len());
    }
}
