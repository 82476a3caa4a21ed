//! Shared type definitions for the Secret Santa game.
//!
//! This crate holds the vocabulary every other crate in the workspace
//! speaks: identifiers, the game lifecycle state and the names of the
//! persisted aggregate fields.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for game and player identifiers
//! - [`enums`] -- Game lifecycle state and persisted field names

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{GameField, GameState, UnknownGameState};
pub use ids::{GameId, PlayerId};
