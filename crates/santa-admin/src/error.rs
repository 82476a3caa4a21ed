//! Error types for the operator CLI.
//!
//! [`AdminError`] wraps every failure a subcommand can hit so that `main`
//! can propagate with `?`.

use santa_types::GameId;

use crate::config::ConfigError;

/// Top-level error for the `santa-admin` binary.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The repository failed.
    #[error("storage error: {source}")]
    Db {
        /// The underlying data layer error.
        #[from]
        source: santa_db::DbError,
    },

    /// The game rejected the operation.
    #[error("game error: {source}")]
    Game {
        /// The underlying domain error.
        #[from]
        source: santa_game::GameError,
    },

    /// Writing the export failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// No game with this id exists.
    #[error("game {id} not found")]
    GameNotFound {
        /// The id that was looked up.
        id: GameId,
    },

    /// The command needs `PostgreSQL` but another backend is configured.
    #[error("{command} requires PostgreSQL storage")]
    PostgresRequired {
        /// Name of the subcommand.
        command: &'static str,
    },
}
