//! Game operations as the operator performs them.
//!
//! Every operation loads the game, applies one change, saves it and, when
//! players have to hear about it, starts the notice fan-out. The returned
//! [`Dispatch`] may be awaited or dropped; delivery failures never fail
//! the operation.

use std::sync::Arc;

use chrono::NaiveDate;
use santa_db::GameRepository;
use santa_game::{GameLimits, GameSanta, Player};
use santa_notify::{
    Dispatch, Notifier, date_notices, deletion_notices, description_notices, dispatch,
    shuffle_notices,
};
use santa_types::GameId;
use tracing::info;

use crate::error::AdminError;

/// Game operations over a repository and a notifier.
pub struct Admin {
    repo: Arc<dyn GameRepository>,
    notifier: Arc<dyn Notifier>,
    limits: GameLimits,
}

impl Admin {
    /// Create the operation set.
    pub fn new(
        repo: Arc<dyn GameRepository>,
        notifier: Arc<dyn Notifier>,
        limits: GameLimits,
    ) -> Self {
        Self {
            repo,
            notifier,
            limits,
        }
    }

    async fn load(&self, id: GameId) -> Result<GameSanta, AdminError> {
        self.repo
            .get(id)
            .await?
            .ok_or(AdminError::GameNotFound { id })
    }

    fn notify(&self, notices: Vec<santa_notify::Notice>) -> Dispatch {
        dispatch(Arc::clone(&self.notifier), notices)
    }

    /// Create and store a game with registration open.
    pub async fn create(
        &self,
        initiator_id: i64,
        initiator_name: &str,
        title: &str,
        description: &str,
        date: NaiveDate,
    ) -> Result<GameSanta, AdminError> {
        let mut game = GameSanta::new(initiator_id, initiator_name);
        game.set_title(self.limits.clip_title(title));
        game.set_description(self.limits.clip_description(description));
        game.set_date_finish(date);

        let id = self.repo.save(&mut game).await?;
        info!(game_id = %id, initiator_id, "game created");
        Ok(game)
    }

    /// Register a player.
    pub async fn join(&self, id: GameId, player: Player) -> Result<GameSanta, AdminError> {
        let mut game = self.load(id).await?;
        let telegram_id = player.telegram_id;
        game.add_player(player)?;
        self.repo.save(&mut game).await?;

        info!(
            game_id = %id,
            telegram_id,
            players = game.players().len(),
            "player joined"
        );
        Ok(game)
    }

    /// Open or close registration.
    pub async fn toggle(&self, id: GameId) -> Result<GameSanta, AdminError> {
        let mut game = self.load(id).await?;
        let state = game.toggle_registration()?;
        self.repo.save(&mut game).await?;

        info!(game_id = %id, %state, "registration toggled");
        Ok(game)
    }

    /// Assign recipients, then tell every player their own.
    pub async fn shuffle(&self, id: GameId) -> Result<(GameSanta, Dispatch), AdminError> {
        let mut game = self.load(id).await?;
        game.shuffle()?;
        self.repo.save(&mut game).await?;

        info!(game_id = %id, players = game.players().len(), "recipients assigned");
        let notices = self.notify(shuffle_notices(&game));
        Ok((game, notices))
    }

    /// Replace the description and tell every player.
    pub async fn set_description(
        &self,
        id: GameId,
        description: &str,
    ) -> Result<(GameSanta, Dispatch), AdminError> {
        let mut game = self.load(id).await?;
        game.set_description(self.limits.clip_description(description));
        self.repo.save(&mut game).await?;

        info!(game_id = %id, "description changed");
        let notices = self.notify(description_notices(&game));
        Ok((game, notices))
    }

    /// Move the gift exchange and tell every player.
    pub async fn set_date(
        &self,
        id: GameId,
        date: NaiveDate,
    ) -> Result<(GameSanta, Dispatch), AdminError> {
        let mut game = self.load(id).await?;
        game.set_date_finish(date);
        self.repo.save(&mut game).await?;

        info!(game_id = %id, %date, "date changed");
        let notices = self.notify(date_notices(&game));
        Ok((game, notices))
    }

    /// Load one game.
    pub async fn show(&self, id: GameId) -> Result<GameSanta, AdminError> {
        self.load(id).await
    }

    /// Every game the user organizes or plays in.
    pub async fn list(&self, telegram_id: i64) -> Result<Vec<GameSanta>, AdminError> {
        Ok(self.repo.get_list(telegram_id).await?)
    }

    /// CSV export of the players; `None` when there is nothing to export.
    pub async fn export(&self, id: GameId) -> Result<Option<Vec<u8>>, AdminError> {
        Ok(self.repo.get_players_csv(id).await?)
    }

    /// Delete the game and tell every player.
    pub async fn delete(&self, id: GameId) -> Result<(GameSanta, Dispatch), AdminError> {
        let game = self.load(id).await?;
        self.repo.delete(&game).await?;

        info!(game_id = %id, players = game.players().len(), "game deleted");
        let notices = self.notify(deletion_notices(&game));
        Ok((game, notices))
    }

    /// Play the office party: three players join, registration closes and
    /// recipients are assigned.
    pub async fn demo(&self) -> Result<GameSanta, AdminError> {
        let game = self
            .create(
                1,
                "Organizer",
                "Office Party",
                "Gifts under 20",
                NaiveDate::from_ymd_opt(2024, 12, 24).unwrap_or_default(),
            )
            .await?;
        let id = game.id().ok_or(santa_game::GameError::NotPersisted)?;

        for (telegram_id, name) in [(10, "A"), (11, "B"), (12, "C")] {
            self.join(id, Player::new(telegram_id, name, None)).await?;
        }
        self.toggle(id).await?;

        let (game, notices) = self.shuffle(id).await?;
        let summary = notices.wait().await;
        info!(
            delivered = summary.delivered,
            failed = summary.failed,
            "demo notices sent"
        );
        Ok(game)
    }
}

/// Human-readable summary of a game.
pub fn describe(game: &GameSanta) -> String {
    let id = game.id().map_or_else(|| "-".to_owned(), |id| id.to_string());
    let date = game
        .date_finish()
        .map_or_else(|| "-".to_owned(), |date| date.to_string());

    let mut lines = vec![
        format!("{} [{}]", game.title(), game.state()),
        format!("  id: {id}"),
        format!(
            "  organizer: {} ({})",
            game.initiator_fullname(),
            game.initiator_id()
        ),
        format!("  date: {date}"),
        format!("  description: {}", game.description()),
        format!("  players: {}", game.players().len()),
    ];
    for (seat, player) in game.players().iter().enumerate() {
        let line = match game.recipient_of(seat) {
            Some(recipient) => format!(
                "    {} ({}) -> {} ({})",
                player.fullname, player.telegram_id, recipient.fullname, recipient.telegram_id
            ),
            None => format!("    {} ({})", player.fullname, player.telegram_id),
        };
        lines.push(line);
    }
    lines.join("\n")
}
