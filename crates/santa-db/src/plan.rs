//! Write planning: from a change envelope to the statements a save issues.
//!
//! A save consists of up to three independent writes, each triggered by
//! one fact in the envelope:
//!
//! | Trigger | Statement |
//! |---------|-----------|
//! | dirty fields, game has an id | `UPDATE games SET <dirty columns> WHERE uuid = ..` |
//! | game has no id | `INSERT INTO games (<dirty columns>) .. RETURNING uuid` |
//! | newly added players | one batched `INSERT INTO players` |
//! | shuffle flag | one batched `UPDATE players SET recipient_id` |
//!
//! Nothing is diffed against a fresh copy from storage: an empty envelope
//! produces an empty plan.

use chrono::NaiveDate;
use santa_game::GameSanta;
use santa_types::{GameField, GameId};
use sqlx::{Postgres, QueryBuilder};

use crate::error::DbError;

/// A field value ready to be bound to a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// `SMALLINT` column.
    SmallInt(i16),
    /// `BIGINT` column.
    BigInt(i64),
    /// `VARCHAR` column.
    Text(String),
    /// `DATE` column.
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Current value of `field` on the aggregate.
    pub fn of(game: &GameSanta, field: GameField) -> Self {
        match field {
            GameField::State => Self::SmallInt(game.state().ordinal()),
            GameField::InitiatorId => Self::BigInt(game.initiator_id()),
            GameField::InitiatorFullname => Self::Text(game.initiator_fullname().to_owned()),
            GameField::Title => Self::Text(game.title().to_owned()),
            GameField::Description => Self::Text(game.description().to_owned()),
            GameField::DateFinish => Self::Date(game.date_finish()),
        }
    }
}

/// The write to the `games` row, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameRowWrite {
    /// First save: insert a row built from the dirty fields.
    Insert(Vec<(GameField, FieldValue)>),
    /// Later saves: update only the dirty columns.
    Update {
        /// Row to update.
        id: GameId,
        /// Dirty columns and their current values.
        values: Vec<(GameField, FieldValue)>,
    },
}

/// Everything one save of an aggregate has to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// Insert or update of the `games` row.
    pub game_row: Option<GameRowWrite>,
    /// Positions of players to insert, in join order.
    pub new_players: Vec<usize>,
    /// Whether every player's `recipient_id` has to be written.
    pub assign_recipients: bool,
}

impl WritePlan {
    /// Plan the save of `game` from its change envelope.
    pub fn for_game(game: &GameSanta) -> Self {
        let changes = game.changes();
        let values: Vec<(GameField, FieldValue)> = changes
            .fields()
            .iter()
            .map(|&field| (field, FieldValue::of(game, field)))
            .collect();

        let game_row = match game.id() {
            None => Some(GameRowWrite::Insert(values)),
            Some(_) if values.is_empty() => None,
            Some(id) => Some(GameRowWrite::Update { id, values }),
        };

        Self {
            game_row,
            new_players: changes.new_players().iter().copied().collect(),
            assign_recipients: changes.is_shuffled(),
        }
    }

    /// Check that a first save would fill every `NOT NULL` column.
    ///
    /// A game gets its title, description and date before it can be
    /// stored. Updates only ever overwrite columns that already hold a
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NullColumn`] naming the first column the insert
    /// would leave empty.
    pub fn ensure_complete(&self) -> Result<(), DbError> {
        let Some(GameRowWrite::Insert(values)) = &self.game_row else {
            return Ok(());
        };
        let missing = GameField::ALL.into_iter().find(|&field| {
            !values
                .iter()
                .any(|(written, value)| *written == field && *value != FieldValue::Date(None))
        });
        match missing {
            Some(field) => Err(DbError::NullColumn(field.column())),
            None => Ok(()),
        }
    }

    /// Whether the save has nothing to write.
    pub fn is_empty(&self) -> bool {
        self.game_row.is_none() && self.new_players.is_empty() && !self.assign_recipients
    }

    /// Number of statements the save will issue.
    pub fn statement_count(&self) -> usize {
        [
            self.game_row.is_some(),
            !self.new_players.is_empty(),
            self.assign_recipients,
        ]
        .into_iter()
        .filter(|&fires| fires)
        .count()
    }
}

// =============================================================================
// Statement builders
// =============================================================================

/// `INSERT INTO games (..) VALUES (..) RETURNING uuid`.
pub(crate) fn insert_game_query(
    values: Vec<(GameField, FieldValue)>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO games (");
    for (n, (field, _)) in values.iter().enumerate() {
        if n > 0 {
            builder.push(", ");
        }
        builder.push(field.column());
    }
    builder.push(") VALUES (");
    for (n, (_, value)) in values.into_iter().enumerate() {
        if n > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(") RETURNING uuid");
    builder
}

/// `UPDATE games SET <col> = $n, .. WHERE uuid = $m`.
pub(crate) fn update_game_query(
    id: GameId,
    values: Vec<(GameField, FieldValue)>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE games SET ");
    for (n, (field, value)) in values.into_iter().enumerate() {
        if n > 0 {
            builder.push(", ");
        }
        builder.push(field.column());
        builder.push(" = ");
        push_value(&mut builder, value);
    }
    builder.push(" WHERE uuid = ");
    builder.push_bind(id.into_inner());
    builder
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: FieldValue) {
    match value {
        FieldValue::SmallInt(v) => {
            builder.push_bind(v);
        }
        FieldValue::BigInt(v) => {
            builder.push_bind(v);
        }
        FieldValue::Text(v) => {
            builder.push_bind(v);
        }
        FieldValue::Date(v) => {
            builder.push_bind(v);
        }
    }
}

/// Batched player insert; returns `(id, telegram_id)` for every new row.
pub(crate) const INSERT_PLAYERS_SQL: &str = r"INSERT INTO players (telegram_id, fullname, username, game_uuid)
  SELECT * FROM UNNEST($1::BIGINT[], $2::VARCHAR[], $3::VARCHAR[], $4::UUID[])
  RETURNING id, telegram_id";

/// Batched recipient assignment keyed by player id.
pub(crate) const ASSIGN_RECIPIENTS_SQL: &str = r"UPDATE players SET recipient_id = v.recipient_id
  FROM UNNEST($1::INTEGER[], $2::INTEGER[]) AS v(id, recipient_id)
  WHERE players.id = v.id";
