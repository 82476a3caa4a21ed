//! The [`Player`] child entity.

use santa_types::{GameId, PlayerId};

/// A participant of one game.
///
/// The recipient is held as a position in the owning game's player list,
/// never as a reference to another `Player`. Use
/// [`GameSanta::recipient_of`](crate::GameSanta::recipient_of) to resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Storage-assigned id, `None` until the player is inserted.
    pub id: Option<PlayerId>,
    /// External (Telegram) user id.
    pub telegram_id: i64,
    /// Display name.
    pub fullname: String,
    /// Optional handle.
    pub username: Option<String>,
    /// Owning game, stamped when the player joins.
    pub game_id: Option<GameId>,
    pub(crate) recipient: Option<usize>,
}

impl Player {
    /// A player that has not joined any game yet.
    pub fn new(telegram_id: i64, fullname: impl Into<String>, username: Option<String>) -> Self {
        Self {
            id: None,
            telegram_id,
            fullname: fullname.into(),
            username,
            game_id: None,
            recipient: None,
        }
    }

    /// A player as read back from storage, before recipient resolution.
    pub fn stored(
        id: PlayerId,
        telegram_id: i64,
        fullname: impl Into<String>,
        username: Option<String>,
        game_id: GameId,
    ) -> Self {
        Self {
            id: Some(id),
            game_id: Some(game_id),
            ..Self::new(telegram_id, fullname, username)
        }
    }

    /// Position of this player's recipient in the owning game's player list.
    pub const fn recipient_seat(&self) -> Option<usize> {
        self.recipient
    }
}
