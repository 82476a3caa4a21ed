//! Player notifications for the Secret Santa game.
//!
//! State-changing operations (shuffle, deletion, description or date
//! change) tell every player about it. Delivery itself belongs to an
//! external transport behind the [`Notifier`] trait; this crate builds the
//! notices and fans them out.
//!
//! Fan-out is fire-and-forget: every notice is delivered by its own task,
//! a failed delivery is logged and never reaches the caller, and nothing
//! is rolled back.
//!
//! # Modules
//!
//! - [`event`] -- What players are told, and who is told what
//! - [`dispatch`] -- The [`Notifier`] port and the concurrent fan-out
//! - [`error`] -- Delivery errors reported by transports

pub mod dispatch;
pub mod error;
pub mod event;

pub use dispatch::{Dispatch, DispatchSummary, LogNotifier, Notifier, dispatch};
pub use error::NotifyError;
pub use event::{
    GameEvent, Notice, date_notices, deletion_notices, description_notices, shuffle_notices,
};
