//! Error types for the data layer.
//!
//! Storage errors are passed through unmodified; nothing in this crate
//! retries or recovers locally.

use santa_game::GameError;
use santa_types::{GameId, UnknownGameState};

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Writing the CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A stored game has a state ordinal this build does not know.
    #[error("invalid stored state: {0}")]
    InvalidState(#[from] UnknownGameState),

    /// The aggregate rejected the operation.
    #[error("game error: {0}")]
    Domain(#[from] GameError),

    /// The game row a save refers to no longer exists.
    #[error("game {0} does not exist")]
    MissingGame(GameId),

    /// A save would leave a `NOT NULL` column of `games` empty.
    #[error("column games.{0} cannot be null")]
    NullColumn(&'static str),

    /// The in-memory backend ran out of player ids.
    #[error("player id space exhausted")]
    IdSpaceExhausted,

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
