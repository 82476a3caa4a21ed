//! CSV export of raw player rows.
//!
//! The export mirrors the `players` table: a header row with the column
//! names followed by one row per player. A missing username is written
//! as an empty field.

use uuid::Uuid;

use crate::error::DbError;

/// Field delimiter used when none is configured.
pub const DEFAULT_CSV_DELIMITER: u8 = b';';

/// Columns of the `players` table, in export order.
pub const PLAYER_COLUMNS: [&str; 6] = [
    "id",
    "telegram_id",
    "fullname",
    "username",
    "recipient_id",
    "game_uuid",
];

/// A row from the `players` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PlayerRow {
    /// Auto-incremented player ID.
    pub id: i32,
    /// External user id.
    pub telegram_id: i64,
    /// Display name.
    pub fullname: String,
    /// Optional handle.
    pub username: Option<String>,
    /// Player this one gives a gift to.
    pub recipient_id: Option<i32>,
    /// Owning game.
    pub game_uuid: Uuid,
}

impl PlayerRow {
    fn to_record(&self) -> [String; 6] {
        [
            self.id.to_string(),
            self.telegram_id.to_string(),
            self.fullname.clone(),
            self.username.clone().unwrap_or_default(),
            self.recipient_id.map(|r| r.to_string()).unwrap_or_default(),
            self.game_uuid.to_string(),
        ]
    }
}

/// Render player rows as delimiter-separated bytes.
///
/// Returns `None` when there are no rows.
///
/// # Errors
///
/// Returns [`DbError::Csv`] if a record cannot be written.
pub fn players_csv(rows: &[PlayerRow], delimiter: u8) -> Result<Option<Vec<u8>>, DbError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(PLAYER_COLUMNS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::Csv(csv::Error::from(e.into_error())))?;
    Ok(Some(bytes))
}
