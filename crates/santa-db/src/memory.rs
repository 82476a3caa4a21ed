//! In-memory implementation of [`GameRepository`].
//!
//! Keeps the same `games` and `players` rows as the `PostgreSQL` backend
//! and applies each save through the same [`WritePlan`]: only the dirty
//! columns of the game row are overwritten, new players are appended and
//! recipients are written by player id. Two copies of one game saved one
//! after the other therefore merge per column, exactly as they would in
//! the database. A save is checked in full before anything is written.
//! Nothing survives the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use santa_game::{GameError, GameSanta};
use santa_types::{GameId, PlayerId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;
use crate::export::{DEFAULT_CSV_DELIMITER, PlayerRow, players_csv};
use crate::plan::{GameRowWrite, WritePlan};
use crate::repository::GameRepository;
use crate::row::GameRow;

#[derive(Debug, Default)]
struct Store {
    games: BTreeMap<Uuid, GameRow>,
    players: BTreeMap<i32, PlayerRow>,
    last_player_id: i32,
}

impl Store {
    fn next_player_id(&mut self) -> Result<PlayerId, DbError> {
        self.last_player_id = self
            .last_player_id
            .checked_add(1)
            .ok_or(DbError::IdSpaceExhausted)?;
        Ok(PlayerId(self.last_player_id))
    }

    /// Player rows of one game in id order.
    fn players_of(&self, game: Uuid) -> Vec<PlayerRow> {
        self.players
            .values()
            .filter(|player| player.game_uuid == game)
            .cloned()
            .collect()
    }

    fn load(&self, row: &GameRow) -> Result<GameSanta, DbError> {
        row.clone().into_game(self.players_of(row.uuid))
    }

    fn require_game(&self, id: GameId) -> Result<(), DbError> {
        if self.games.contains_key(&id.into_inner()) {
            Ok(())
        } else {
            Err(DbError::MissingGame(id))
        }
    }
}

/// Process-local game repository.
#[derive(Debug)]
pub struct MemoryRepository {
    store: RwLock<Store>,
    csv_delimiter: u8,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            csv_delimiter: DEFAULT_CSV_DELIMITER,
        }
    }

    /// Set the field delimiter of the CSV export.
    #[must_use]
    pub const fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Number of stored games.
    pub async fn len(&self) -> usize {
        self.store.read().await.games.len()
    }

    /// Whether no game is stored.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.games.is_empty()
    }
}

#[async_trait]
impl GameRepository for MemoryRepository {
    async fn get(&self, id: GameId) -> Result<Option<GameSanta>, DbError> {
        let store = self.store.read().await;
        store
            .games
            .get(&id.into_inner())
            .map(|row| store.load(row))
            .transpose()
    }

    async fn get_list(&self, telegram_id: i64) -> Result<Vec<GameSanta>, DbError> {
        let store = self.store.read().await;
        store
            .games
            .values()
            .filter(|row| {
                row.initiator_id == telegram_id
                    || store
                        .players
                        .values()
                        .any(|p| p.game_uuid == row.uuid && p.telegram_id == telegram_id)
            })
            .map(|row| store.load(row))
            .collect()
    }

    async fn save(&self, game: &mut GameSanta) -> Result<GameId, DbError> {
        let plan = WritePlan::for_game(game);
        if plan.is_empty() {
            return game.id().ok_or(DbError::Domain(GameError::NotPersisted));
        }
        plan.ensure_complete()?;

        let mut store = self.store.write().await;

        // Everything that can fail happens before the first write.
        let (game_id, game_row) = match plan.game_row {
            Some(GameRowWrite::Insert(values)) => {
                let id = GameId::new();
                (id, Some(GameRow::inserted(id.into_inner(), values)?))
            }
            Some(GameRowWrite::Update { id, values }) => {
                let mut row = store
                    .games
                    .get(&id.into_inner())
                    .cloned()
                    .ok_or(DbError::MissingGame(id))?;
                row.write(values)?;
                (id, Some(row))
            }
            None => {
                let id = game.id().ok_or(DbError::Domain(GameError::NotPersisted))?;
                store.require_game(id)?;
                (id, None)
            }
        };

        let mut inserted = Vec::with_capacity(plan.new_players.len());
        for &seat in &plan.new_players {
            inserted.push((seat, store.next_player_id()?));
        }

        if let Some(row) = game_row {
            store.games.insert(row.uuid, row);
        }
        for &(seat, id) in &inserted {
            if let Some(player) = game.players().get(seat) {
                store.players.insert(
                    id.into_inner(),
                    PlayerRow {
                        id: id.into_inner(),
                        telegram_id: player.telegram_id,
                        fullname: player.fullname.clone(),
                        username: player.username.clone(),
                        recipient_id: None,
                        game_uuid: game_id.into_inner(),
                    },
                );
            }
        }

        if plan.assign_recipients {
            let mut player_ids: Vec<Option<PlayerId>> =
                game.players().iter().map(|p| p.id).collect();
            for &(seat, id) in &inserted {
                if let Some(slot) = player_ids.get_mut(seat) {
                    *slot = Some(id);
                }
            }
            let id_at = |seat: usize| player_ids.get(seat).copied().flatten();
            for (seat, player) in game.players().iter().enumerate() {
                let (Some(giver), Some(recipient)) =
                    (id_at(seat), player.recipient_seat().and_then(id_at))
                else {
                    continue;
                };
                if let Some(row) = store.players.get_mut(&giver.into_inner()) {
                    row.recipient_id = Some(recipient.into_inner());
                }
            }
        }
        drop(store);

        game.assign_id(game_id);
        for (seat, id) in inserted {
            game.assign_player_id(seat, id);
        }
        game.mark_saved();

        tracing::debug!(game_id = %game_id, "Saved game in memory");
        Ok(game_id)
    }

    async fn delete(&self, game: &GameSanta) -> Result<(), DbError> {
        let Some(id) = game.id() else {
            return Ok(());
        };
        let uuid = id.into_inner();
        let mut store = self.store.write().await;
        store.games.remove(&uuid);
        store.players.retain(|_, player| player.game_uuid != uuid);
        Ok(())
    }

    async fn get_players_csv(&self, id: GameId) -> Result<Option<Vec<u8>>, DbError> {
        let rows = self.store.read().await.players_of(id.into_inner());
        players_csv(&rows, self.csv_delimiter)
    }
}
