//! Error types for game mutations.
//!
//! Only caller-visible rejections live here. Absence of a game is never
//! an error; repositories return `None` for that.

use santa_types::GameState;

/// An operation on a game that depends on its lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Flip between open and closed registration.
    ToggleRegistration,
    /// Assign recipients.
    Shuffle,
    /// Add a player.
    Join,
}

impl core::fmt::Display for GameAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ToggleRegistration => "toggle registration",
            Self::Shuffle => "shuffle",
            Self::Join => "join",
        };
        f.write_str(name)
    }
}

/// Errors returned by rejected game mutations.
///
/// A rejected mutation leaves the aggregate and its envelope untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The action is not allowed in the game's current state.
    #[error("cannot {action} a game in state {state}")]
    InvalidTransition {
        /// State the game was in.
        state: GameState,
        /// The rejected action.
        action: GameAction,
    },

    /// A shuffle needs at least two players to form a cycle.
    #[error("shuffle needs at least 2 players, game has {count}")]
    NotEnoughPlayers {
        /// Number of players in the game.
        count: usize,
    },

    /// Players can only join a game that has been saved at least once.
    #[error("game has not been saved yet")]
    NotPersisted,

    /// The user already plays in this game.
    #[error("user {telegram_id} already joined the game")]
    AlreadyMember {
        /// External user id of the duplicate player.
        telegram_id: i64,
    },
}
