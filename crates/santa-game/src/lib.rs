//! Game aggregate for the Secret Santa game.
//!
//! A [`GameSanta`] owns its [`Player`]s and is loaded and saved as one
//! unit. Every mutation goes through a method on the aggregate, which
//! applies the change and records it in the attached [`Changes`]
//! envelope. The persistence layer reads that envelope to decide which
//! statements a save has to issue.
//!
//! # Modules
//!
//! - [`game`] -- The [`GameSanta`] aggregate, its state machine and shuffle
//! - [`player`] -- The [`Player`] child entity
//! - [`changes`] -- The change-tracking envelope
//! - [`limits`] -- Title and description length limits applied by callers
//! - [`error`] -- Rejected operations
//!
//! # Usage
//!
//! ```
//! use santa_game::{GameSanta, Player};
//! use santa_types::{GameId, GameState};
//!
//! let mut game = GameSanta::new(42, "Ada Lovelace");
//! game.set_title("Office Party");
//! game.assign_id(GameId::new());
//!
//! for (telegram_id, name) in [(1, "A"), (2, "B"), (3, "C")] {
//!     game.add_player(Player::new(telegram_id, name, None)).ok();
//! }
//!
//! assert!(game.shuffle().is_ok());
//! assert_eq!(game.state(), GameState::Allocated);
//! assert!(game.assignments().all(|(giver, recipient)| giver != recipient));
//! ```

pub mod changes;
pub mod error;
pub mod game;
pub mod limits;
pub mod player;

pub use changes::Changes;
pub use error::{GameAction, GameError};
pub use game::{GameParts, GameSanta, LoadedPlayer};
pub use limits::GameLimits;
pub use player::Player;
