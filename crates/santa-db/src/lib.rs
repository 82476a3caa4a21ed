//! Persistence layer for the Secret Santa game.
//!
//! Every backend implements [`GameRepository`]. Callers pick one at
//! construction time and hold it as `Arc<dyn GameRepository>`.
//!
//! # Architecture
//!
//! ```text
//! GameSanta (mutated through its methods)
//!     |
//!     +-- changes() envelope --> WritePlan
//!                                  |
//!                                  +-- PgRepository      (PostgreSQL, one transaction)
//!                                  |     |-- UPDATE games SET <dirty columns>
//!                                  |     |-- INSERT INTO players (new players)
//!                                  |     +-- UPDATE players SET recipient_id
//!                                  |
//!                                  +-- MemoryRepository  (process-local rows, same writes)
//! ```
//!
//! # Modules
//!
//! - [`repository`] -- The [`GameRepository`] contract and backend selection
//! - [`plan`] -- Turns a change envelope into the statements a save issues
//! - [`pg_repository`] -- `PostgreSQL` backend
//! - [`memory`] -- In-memory backend
//! - [`row`] -- Stored shape of a game shared by both backends
//! - [`export`] -- CSV export of player rows
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod export;
pub mod memory;
pub mod pg_repository;
pub mod plan;
pub mod postgres;
pub mod repository;
pub mod row;

// Re-export primary types for convenience.
pub use error::DbError;
pub use export::{DEFAULT_CSV_DELIMITER, PLAYER_COLUMNS, PlayerRow};
pub use memory::MemoryRepository;
pub use pg_repository::PgRepository;
pub use plan::{FieldValue, GameRowWrite, WritePlan};
pub use postgres::{PostgresConfig, PostgresPool};
pub use repository::{GameRepository, StorageKind};
pub use row::GameRow;
