//! The stored shape of a game: one `games` row plus its `players` rows.
//!
//! Both backends keep games in this shape and rebuild the aggregate from
//! it, so they apply a save's column writes the same way.

use chrono::NaiveDate;
use santa_game::{GameParts, GameSanta, LoadedPlayer, Player};
use santa_types::{GameField, GameId, GameState, PlayerId};
use uuid::Uuid;

use crate::error::DbError;
use crate::export::PlayerRow;
use crate::plan::FieldValue;

/// A row from the `games` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GameRow {
    /// Game id.
    pub uuid: Uuid,
    /// State ordinal.
    pub state: i16,
    /// External id of the organizer.
    pub initiator_id: i64,
    /// Display name of the organizer.
    pub initiator_fullname: String,
    /// Game title.
    pub title: String,
    /// Game description.
    pub description: String,
    /// Day of the gift exchange.
    pub date_finish: NaiveDate,
}

impl GameRow {
    /// Build a new row from the values of an insert.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NullColumn`] if a column is left without a value.
    pub(crate) fn inserted(
        uuid: Uuid,
        values: Vec<(GameField, FieldValue)>,
    ) -> Result<Self, DbError> {
        for field in GameField::ALL {
            if !values.iter().any(|(written, _)| *written == field) {
                return Err(DbError::NullColumn(field.column()));
            }
        }

        let mut row = Self {
            uuid,
            state: GameState::default().ordinal(),
            initiator_id: 0,
            initiator_fullname: String::new(),
            title: String::new(),
            description: String::new(),
            date_finish: NaiveDate::default(),
        };
        row.write(values)?;
        Ok(row)
    }

    /// Overwrite the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NullColumn`] for a `NULL` date.
    pub(crate) fn write(&mut self, values: Vec<(GameField, FieldValue)>) -> Result<(), DbError> {
        for (field, value) in values {
            match (field, value) {
                (GameField::State, FieldValue::SmallInt(state)) => self.state = state,
                (GameField::InitiatorId, FieldValue::BigInt(id)) => self.initiator_id = id,
                (GameField::InitiatorFullname, FieldValue::Text(name)) => {
                    self.initiator_fullname = name;
                }
                (GameField::Title, FieldValue::Text(title)) => self.title = title,
                (GameField::Description, FieldValue::Text(text)) => self.description = text,
                (GameField::DateFinish, FieldValue::Date(Some(date))) => self.date_finish = date,
                (field, _) => return Err(DbError::NullColumn(field.column())),
            }
        }
        Ok(())
    }

    /// Rebuild the aggregate from this row and its player rows.
    pub(crate) fn into_game(self, players: Vec<PlayerRow>) -> Result<GameSanta, DbError> {
        let id = GameId(self.uuid);
        let players = players
            .into_iter()
            .map(|row| LoadedPlayer {
                recipient_id: row.recipient_id.map(PlayerId),
                player: Player::stored(
                    PlayerId(row.id),
                    row.telegram_id,
                    row.fullname,
                    row.username,
                    id,
                ),
            })
            .collect();

        Ok(GameSanta::from_parts(GameParts {
            id,
            state: GameState::try_from(self.state)?,
            players,
            initiator_id: self.initiator_id,
            initiator_fullname: self.initiator_fullname,
            title: self.title,
            description: self.description,
            date_finish: Some(self.date_finish),
        }))
    }
}
