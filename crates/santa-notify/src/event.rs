//! Game notices and their recipients.

use chrono::NaiveDate;
use santa_game::GameSanta;

/// Something a player is told about a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Recipients were assigned; carries this player's own recipient.
    RecipientAssigned {
        /// Game title.
        title: String,
        /// External id of the player to give a gift to.
        recipient_telegram_id: i64,
        /// Display name of the player to give a gift to.
        recipient_fullname: String,
    },
    /// The organizer changed the description.
    DescriptionChanged {
        /// Game title.
        title: String,
        /// New description.
        description: String,
    },
    /// The organizer moved the gift exchange.
    DateChanged {
        /// Game title.
        title: String,
        /// New day of the gift exchange.
        date: NaiveDate,
    },
    /// The organizer deleted the game.
    GameDeleted {
        /// Game title.
        title: String,
        /// External id of the organizer.
        initiator_id: i64,
        /// Display name of the organizer.
        initiator_fullname: String,
    },
}

impl core::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RecipientAssigned {
                title,
                recipient_fullname,
                ..
            } => write!(f, "Game \"{title}\": you are Secret Santa for {recipient_fullname}"),
            Self::DescriptionChanged { title, description } => {
                write!(f, "Game \"{title}\" has a new description: {description}")
            }
            Self::DateChanged { title, date } => {
                write!(f, "Game \"{title}\" gift exchange moved to {date}")
            }
            Self::GameDeleted {
                title,
                initiator_fullname,
                ..
            } => write!(f, "Game \"{title}\" was deleted by {initiator_fullname}"),
        }
    }
}

/// One event addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// External id of the user to notify.
    pub telegram_id: i64,
    /// What to tell them.
    pub event: GameEvent,
}

/// Tell every player whom they give a gift to.
///
/// Players without an assigned recipient are skipped.
pub fn shuffle_notices(game: &GameSanta) -> Vec<Notice> {
    game.assignments()
        .map(|(giver, recipient)| Notice {
            telegram_id: giver.telegram_id,
            event: GameEvent::RecipientAssigned {
                title: game.title().to_owned(),
                recipient_telegram_id: recipient.telegram_id,
                recipient_fullname: recipient.fullname.clone(),
            },
        })
        .collect()
}

/// Tell every player about the current description.
pub fn description_notices(game: &GameSanta) -> Vec<Notice> {
    broadcast(
        game,
        &GameEvent::DescriptionChanged {
            title: game.title().to_owned(),
            description: game.description().to_owned(),
        },
    )
}

/// Tell every player about the current exchange date.
///
/// Returns nothing while the game has no date.
pub fn date_notices(game: &GameSanta) -> Vec<Notice> {
    let Some(date) = game.date_finish() else {
        return Vec::new();
    };
    broadcast(
        game,
        &GameEvent::DateChanged {
            title: game.title().to_owned(),
            date,
        },
    )
}

/// Tell every player the game is gone.
pub fn deletion_notices(game: &GameSanta) -> Vec<Notice> {
    broadcast(
        game,
        &GameEvent::GameDeleted {
            title: game.title().to_owned(),
            initiator_id: game.initiator_id(),
            initiator_fullname: game.initiator_fullname().to_owned(),
        },
    )
}

fn broadcast(game: &GameSanta, event: &GameEvent) -> Vec<Notice> {
    game.players()
        .iter()
        .map(|player| Notice {
            telegram_id: player.telegram_id,
            event: event.clone(),
        })
        .collect()
}
