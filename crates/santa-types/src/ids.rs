//! Type-safe identifier wrappers.
//!
//! Games are keyed by a [`Uuid`] generated by storage (`DEFAULT
//! gen_random_uuid()`), players by an auto-incrementing `INTEGER`. Both
//! are wrapped so a player id can never be passed where a game id is
//! expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

// No `Default`: every call mints a fresh id.
#[allow(clippy::new_without_default)]
impl GameId {
    /// Create a new identifier using UUID v7 (time-ordered).
    ///
    /// Used by the in-memory backend, which has no database to generate
    /// identifiers for it.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for GameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for GameId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<GameId> for Uuid {
    fn from(id: GameId) -> Self {
        id.0
    }
}

/// Unique identifier for a player row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PlayerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_id_parses_its_display_form() {
        let id = GameId::new();
        let parsed: Result<GameId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn each_new_game_id_is_fresh() {
        let first = GameId::new();
        let second = GameId::new();
        assert_ne!(first, second);
    }

    #[test]
    fn game_id_rejects_garbage() {
        assert!("not-a-game".parse::<GameId>().is_err());
    }

    #[test]
    fn game_id_roundtrip_serde() {
        let original = GameId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<GameId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn player_id_display_is_plain_integer() {
        assert_eq!(PlayerId(17).to_string(), "17");
    }
}
