//! The repository contract shared by every backend.
//!
//! Implementations must ensure:
//! - `get` loads a game with all of its players and resolved recipients
//! - `save` writes only what the aggregate's change envelope records
//! - deleting a game deletes its players
//! - absence is `Ok(None)`, never an error

use std::str::FromStr;

use async_trait::async_trait;
use santa_game::GameSanta;
use santa_types::GameId;

use crate::error::DbError;

/// Repository port for [`GameSanta`] aggregates.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Load one game with all of its players.
    ///
    /// Returns `None` if the game does not exist.
    async fn get(&self, id: GameId) -> Result<Option<GameSanta>, DbError>;

    /// Every game the user organizes or plays in.
    async fn get_list(&self, telegram_id: i64) -> Result<Vec<GameSanta>, DbError>;

    /// Persist pending changes of a game and return its id.
    ///
    /// Assigns the game id on first save and player ids for newly added
    /// players, then clears the change envelope.
    ///
    /// # Errors
    ///
    /// Storage errors are returned unmodified. On error the aggregate keeps
    /// its pending changes.
    async fn save(&self, game: &mut GameSanta) -> Result<GameId, DbError>;

    /// Delete a game and all of its players.
    ///
    /// Deleting a game that was never saved is a no-op.
    async fn delete(&self, game: &GameSanta) -> Result<(), DbError>;

    /// Export the stored players of a game as delimiter-separated bytes.
    ///
    /// Returns `None` if the game does not exist or has no players.
    async fn get_players_csv(&self, id: GameId) -> Result<Option<Vec<u8>>, DbError>;
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageKind {
    /// [`PgRepository`](crate::PgRepository).
    #[default]
    Postgres,
    /// [`MemoryRepository`](crate::MemoryRepository); nothing survives the process.
    Memory,
}

impl FromStr for StorageKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(DbError::Config(format!("unknown storage backend: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn GameRepository) {}
    }

    #[test]
    fn storage_kind_parses_aliases() {
        assert_eq!("postgres".parse::<StorageKind>().ok(), Some(StorageKind::Postgres));
        assert_eq!(" PG ".parse::<StorageKind>().ok(), Some(StorageKind::Postgres));
        assert_eq!("memory".parse::<StorageKind>().ok(), Some(StorageKind::Memory));
        assert!("redis".parse::<StorageKind>().is_err());
    }
}
