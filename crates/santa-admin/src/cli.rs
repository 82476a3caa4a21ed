//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use santa_types::GameId;

/// Operator CLI for Secret Santa games.
#[derive(Debug, Parser)]
#[command(name = "santa-admin", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply the embedded schema migrations.
    Migrate,

    /// Create a game with registration open.
    Create {
        /// External id of the organizer.
        #[arg(long)]
        initiator_id: i64,
        /// Display name of the organizer.
        #[arg(long)]
        initiator_name: String,
        /// Game title (clipped to the configured limit).
        #[arg(long)]
        title: String,
        /// Game description (clipped to the configured limit).
        #[arg(long)]
        description: String,
        /// Day of the gift exchange, `YYYY-MM-DD`.
        #[arg(long)]
        date: NaiveDate,
    },

    /// Register a user as a player.
    Join {
        /// Game id.
        game: GameId,
        /// External id of the user.
        #[arg(long)]
        telegram_id: i64,
        /// Display name of the user.
        #[arg(long)]
        fullname: String,
        /// Chat handle of the user.
        #[arg(long)]
        username: Option<String>,
    },

    /// Open or close registration.
    Toggle {
        /// Game id.
        game: GameId,
    },

    /// Assign recipients and notify every player.
    Shuffle {
        /// Game id.
        game: GameId,
    },

    /// Replace the description and notify every player.
    SetDescription {
        /// Game id.
        game: GameId,
        /// New description (clipped to the configured limit).
        description: String,
    },

    /// Move the gift exchange and notify every player.
    SetDate {
        /// Game id.
        game: GameId,
        /// New day, `YYYY-MM-DD`.
        date: NaiveDate,
    },

    /// Print one game.
    Show {
        /// Game id.
        game: GameId,
    },

    /// Print every game a user organizes or plays in.
    List {
        /// External id of the user.
        #[arg(long)]
        user: i64,
    },

    /// Export the players of a game as CSV.
    Export {
        /// Game id.
        game: GameId,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a game and its players, notifying every player.
    Delete {
        /// Game id.
        game: GameId,
    },

    /// Play a whole game end to end against the configured storage.
    Demo,
}
