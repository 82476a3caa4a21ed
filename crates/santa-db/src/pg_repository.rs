//! `PostgreSQL` implementation of [`GameRepository`].
//!
//! Reads load the `games` row and then all of its `players` rows in id
//! order. Saves execute a [`WritePlan`] inside one transaction: if any
//! of the sub-writes fails, none of them is committed and the aggregate
//! keeps its pending changes so the save can be retried as a whole.
//! Saving a game that was deleted since it was loaded fails with
//! [`DbError::MissingGame`].

use std::collections::HashMap;

use async_trait::async_trait;
use santa_game::{GameError, GameSanta};
use santa_types::{GameId, PlayerId};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DbError;
use crate::export::{DEFAULT_CSV_DELIMITER, PlayerRow, players_csv};
use crate::plan::{
    ASSIGN_RECIPIENTS_SQL, GameRowWrite, INSERT_PLAYERS_SQL, WritePlan, insert_game_query,
    update_game_query,
};
use crate::postgres::PostgresPool;
use crate::repository::GameRepository;
use crate::row::GameRow;

/// `PostgreSQL`-backed game repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
    csv_delimiter: u8,
}

impl PgRepository {
    /// Create a repository bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            csv_delimiter: DEFAULT_CSV_DELIMITER,
        }
    }

    /// Create a repository sharing the pool of a [`PostgresPool`].
    pub fn from_pool(pool: &PostgresPool) -> Self {
        Self::new(pool.pool().clone())
    }

    /// Set the field delimiter of the CSV export.
    #[must_use]
    pub const fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    async fn players_of(&self, game_ids: &[Uuid]) -> Result<Vec<PlayerRow>, DbError> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            r"SELECT id, telegram_id, fullname, username, recipient_id, game_uuid
              FROM players
              WHERE game_uuid = ANY($1)
              ORDER BY id",
        )
        .bind(game_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl GameRepository for PgRepository {
    async fn get(&self, id: GameId) -> Result<Option<GameSanta>, DbError> {
        let row = sqlx::query_as::<_, GameRow>(
            r"SELECT uuid, state, initiator_id, initiator_fullname, title, description, date_finish
              FROM games
              WHERE uuid = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let players = self.players_of(&[row.uuid]).await?;
        Ok(Some(row.into_game(players)?))
    }

    async fn get_list(&self, telegram_id: i64) -> Result<Vec<GameSanta>, DbError> {
        let rows = sqlx::query_as::<_, GameRow>(
            r"SELECT DISTINCT g.uuid, g.state, g.initiator_id, g.initiator_fullname,
                     g.title, g.description, g.date_finish
              FROM games AS g
              LEFT JOIN players AS p ON p.game_uuid = g.uuid
              WHERE g.initiator_id = $1 OR p.telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let game_ids: Vec<Uuid> = rows.iter().map(|row| row.uuid).collect();
        let mut players_by_game: HashMap<Uuid, Vec<PlayerRow>> = HashMap::new();
        for player in self.players_of(&game_ids).await? {
            players_by_game
                .entry(player.game_uuid)
                .or_default()
                .push(player);
        }

        let games = rows
            .into_iter()
            .map(|row| {
                let players = players_by_game.remove(&row.uuid).unwrap_or_default();
                row.into_game(players)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(telegram_id, count = games.len(), "Listed games");
        Ok(games)
    }

    async fn save(&self, game: &mut GameSanta) -> Result<GameId, DbError> {
        let plan = WritePlan::for_game(game);
        if plan.is_empty() {
            return game.id().ok_or(DbError::Domain(GameError::NotPersisted));
        }
        plan.ensure_complete()?;

        let mut tx = self.pool.begin().await?;

        let game_id = match plan.game_row {
            Some(GameRowWrite::Insert(values)) => {
                let columns = values.len();
                let mut query = insert_game_query(values);
                let uuid: Uuid = query
                    .build_query_scalar()
                    .fetch_one(&mut *tx)
                    .await?;
                tracing::debug!(game_id = %uuid, columns, "Inserted game");
                GameId(uuid)
            }
            Some(GameRowWrite::Update { id, values }) => {
                let columns: Vec<&str> = values.iter().map(|(field, _)| field.column()).collect();
                tracing::debug!(game_id = %id, ?columns, "Updating game");
                let mut query = update_game_query(id, values);
                let updated = query.build().execute(&mut *tx).await?;
                if updated.rows_affected() == 0 {
                    return Err(DbError::MissingGame(id));
                }
                id
            }
            None => {
                let id = game.id().ok_or(DbError::Domain(GameError::NotPersisted))?;
                lock_game(&mut tx, id).await?;
                id
            }
        };

        let inserted = if plan.new_players.is_empty() {
            Vec::new()
        } else {
            insert_players(&mut tx, game, game_id, &plan.new_players).await?
        };

        if plan.assign_recipients {
            let mut player_ids: Vec<Option<PlayerId>> =
                game.players().iter().map(|p| p.id).collect();
            for &(seat, id) in &inserted {
                if let Some(slot) = player_ids.get_mut(seat) {
                    *slot = Some(id);
                }
            }
            assign_recipients(&mut tx, game, &player_ids).await?;
        }

        tx.commit().await?;

        game.assign_id(game_id);
        for (seat, id) in inserted {
            game.assign_player_id(seat, id);
        }
        game.mark_saved();
        Ok(game_id)
    }

    async fn delete(&self, game: &GameSanta) -> Result<(), DbError> {
        let Some(id) = game.id() else {
            return Ok(());
        };

        sqlx::query("DELETE FROM games WHERE uuid = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        tracing::debug!(game_id = %id, "Deleted game");
        Ok(())
    }

    async fn get_players_csv(&self, id: GameId) -> Result<Option<Vec<u8>>, DbError> {
        let rows = self.players_of(&[id.into_inner()]).await?;
        players_csv(&rows, self.csv_delimiter)
    }
}

/// Hold the `games` row for the rest of the transaction.
///
/// Player writes without a `games` update would otherwise go unchecked
/// against a game deleted since it was loaded.
async fn lock_game(tx: &mut Transaction<'_, Postgres>, id: GameId) -> Result<(), DbError> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT uuid FROM games WHERE uuid = $1 FOR UPDATE")
            .bind(id.into_inner())
            .fetch_optional(&mut **tx)
            .await?;
    if locked.is_none() {
        return Err(DbError::MissingGame(id));
    }
    Ok(())
}

/// Insert the players at `seats` in one statement.
///
/// Returns the generated id for each seat. Rows are matched back by
/// `telegram_id`, which is unique within a game.
async fn insert_players(
    tx: &mut Transaction<'_, Postgres>,
    game: &GameSanta,
    game_id: GameId,
    seats: &[usize],
) -> Result<Vec<(usize, PlayerId)>, DbError> {
    let len = seats.len();
    let mut telegram_ids = Vec::with_capacity(len);
    let mut fullnames = Vec::with_capacity(len);
    let mut usernames: Vec<Option<String>> = Vec::with_capacity(len);
    let mut game_uuids = Vec::with_capacity(len);

    for player in seats.iter().filter_map(|&seat| game.players().get(seat)) {
        telegram_ids.push(player.telegram_id);
        fullnames.push(player.fullname.clone());
        usernames.push(player.username.clone());
        game_uuids.push(game_id.into_inner());
    }

    let rows: Vec<(i32, i64)> = sqlx::query_as(INSERT_PLAYERS_SQL)
        .bind(&telegram_ids)
        .bind(&fullnames)
        .bind(&usernames)
        .bind(&game_uuids)
        .fetch_all(&mut **tx)
        .await?;

    let by_telegram: HashMap<i64, i32> = rows.into_iter().map(|(id, tg)| (tg, id)).collect();
    let inserted: Vec<(usize, PlayerId)> = seats
        .iter()
        .filter_map(|&seat| {
            let player = game.players().get(seat)?;
            by_telegram
                .get(&player.telegram_id)
                .map(|&id| (seat, PlayerId(id)))
        })
        .collect();

    tracing::debug!(game_id = %game_id, count = inserted.len(), "Inserted players");
    Ok(inserted)
}

/// Write every player's recipient in one statement.
async fn assign_recipients(
    tx: &mut Transaction<'_, Postgres>,
    game: &GameSanta,
    player_ids: &[Option<PlayerId>],
) -> Result<(), DbError> {
    let id_at = |seat: usize| player_ids.get(seat).copied().flatten();
    let (givers, recipients): (Vec<i32>, Vec<i32>) = game
        .players()
        .iter()
        .enumerate()
        .filter_map(|(seat, player)| {
            let giver = id_at(seat)?;
            let recipient = id_at(player.recipient_seat()?)?;
            Some((giver.into_inner(), recipient.into_inner()))
        })
        .unzip();

    sqlx::query(ASSIGN_RECIPIENTS_SQL)
        .bind(&givers)
        .bind(&recipients)
        .execute(&mut **tx)
        .await?;

    tracing::debug!(count = givers.len(), "Assigned recipients");
    Ok(())
}
