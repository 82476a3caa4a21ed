//! The [`GameSanta`] aggregate root.
//!
//! # Design
//!
//! - **Explicit tracking**: every setter records the field it wrote in the
//!   [`Changes`] envelope. There is no implicit interception.
//! - **Append-only players**: players are never removed from a loaded
//!   aggregate, so a player's position in [`GameSanta::players`] is stable
//!   and doubles as the recipient link.
//! - **Terminal allocation**: once recipients are assigned the game cannot
//!   be reopened or reshuffled.

use std::collections::HashMap;

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use santa_types::{GameField, GameId, GameState, PlayerId};

use crate::changes::Changes;
use crate::error::{GameAction, GameError};
use crate::player::Player;

/// A player read from storage together with its raw recipient reference.
#[derive(Debug, Clone)]
pub struct LoadedPlayer {
    /// The stored player.
    pub player: Player,
    /// Value of `players.recipient_id`.
    pub recipient_id: Option<PlayerId>,
}

/// Every stored field of a game, as read by a repository.
#[derive(Debug, Clone)]
pub struct GameParts {
    /// Game id.
    pub id: GameId,
    /// Lifecycle state.
    pub state: GameState,
    /// Players in insertion order.
    pub players: Vec<LoadedPlayer>,
    /// External id of the organizer.
    pub initiator_id: i64,
    /// Display name of the organizer.
    pub initiator_fullname: String,
    /// Game title.
    pub title: String,
    /// Game description.
    pub description: String,
    /// Day of the gift exchange.
    pub date_finish: Option<NaiveDate>,
}

/// A Secret Santa game and its players.
#[derive(Debug, Clone)]
pub struct GameSanta {
    id: Option<GameId>,
    state: GameState,
    players: Vec<Player>,
    initiator_id: i64,
    initiator_fullname: String,
    title: String,
    description: String,
    date_finish: Option<NaiveDate>,
    changes: Changes,
}

impl GameSanta {
    /// Create a new, unsaved game organized by the given user.
    pub fn new(initiator_id: i64, initiator_fullname: impl Into<String>) -> Self {
        Self {
            id: None,
            state: GameState::RegistrationOpen,
            players: Vec::new(),
            initiator_id,
            initiator_fullname: initiator_fullname.into(),
            title: String::new(),
            description: String::new(),
            date_finish: None,
            changes: Changes::fresh(),
        }
    }

    /// Rebuild a stored game with a clean envelope.
    ///
    /// Recipient references are resolved through a `PlayerId -> position`
    /// index built once for the whole player list. A reference that points
    /// outside this game is dropped.
    pub fn from_parts(parts: GameParts) -> Self {
        let index: HashMap<PlayerId, usize> = parts
            .players
            .iter()
            .enumerate()
            .filter_map(|(seat, loaded)| loaded.player.id.map(|id| (id, seat)))
            .collect();

        let players = parts
            .players
            .into_iter()
            .map(|loaded| {
                let mut player = loaded.player;
                player.recipient = loaded.recipient_id.and_then(|recipient_id| {
                    let seat = index.get(&recipient_id).copied();
                    if seat.is_none() {
                        tracing::warn!(
                            game_id = %parts.id,
                            recipient_id = %recipient_id,
                            "recipient does not belong to this game"
                        );
                    }
                    seat
                });
                player
            })
            .collect();

        Self {
            id: Some(parts.id),
            state: parts.state,
            players,
            initiator_id: parts.initiator_id,
            initiator_fullname: parts.initiator_fullname,
            title: parts.title,
            description: parts.description,
            date_finish: parts.date_finish,
            changes: Changes::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Storage id, `None` before the first save.
    pub const fn id(&self) -> Option<GameId> {
        self.id
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// External id of the organizer.
    pub const fn initiator_id(&self) -> i64 {
        self.initiator_id
    }

    /// Display name of the organizer.
    pub fn initiator_fullname(&self) -> &str {
        &self.initiator_fullname
    }

    /// Game title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Game description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Day of the gift exchange.
    pub const fn date_finish(&self) -> Option<NaiveDate> {
        self.date_finish
    }

    /// Changes recorded since load or creation.
    pub const fn changes(&self) -> &Changes {
        &self.changes
    }

    /// Whether the given user plays in this game.
    pub fn is_member(&self, telegram_id: i64) -> bool {
        self.players.iter().any(|p| p.telegram_id == telegram_id)
    }

    /// Whether the given user organizes or plays in this game.
    pub fn involves(&self, telegram_id: i64) -> bool {
        self.initiator_id == telegram_id || self.is_member(telegram_id)
    }

    /// The player who receives a gift from the player at `seat`.
    pub fn recipient_of(&self, seat: usize) -> Option<&Player> {
        self.players
            .get(seat)
            .and_then(|giver| giver.recipient)
            .and_then(|recipient| self.players.get(recipient))
    }

    /// Storage id of the recipient of the player at `seat`.
    pub fn recipient_ref(&self, seat: usize) -> Option<PlayerId> {
        self.recipient_of(seat).and_then(|recipient| recipient.id)
    }

    /// Every `(giver, recipient)` pair that has been assigned.
    pub fn assignments(&self) -> impl Iterator<Item = (&Player, &Player)> + '_ {
        self.players.iter().filter_map(|giver| {
            giver
                .recipient
                .and_then(|seat| self.players.get(seat))
                .map(|recipient| (giver, recipient))
        })
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Set the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.changes.touch(GameField::Title);
    }

    /// Set the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.changes.touch(GameField::Description);
    }

    /// Set the day of the gift exchange.
    pub fn set_date_finish(&mut self, date: NaiveDate) {
        self.date_finish = Some(date);
        self.changes.touch(GameField::DateFinish);
    }

    /// Flip between open and closed registration.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] once the game is allocated.
    pub fn toggle_registration(&mut self) -> Result<GameState, GameError> {
        let next = match self.state {
            GameState::RegistrationOpen => GameState::RegistrationClose,
            GameState::RegistrationClose => GameState::RegistrationOpen,
            GameState::Allocated => {
                return Err(GameError::InvalidTransition {
                    state: self.state,
                    action: GameAction::ToggleRegistration,
                });
            }
        };
        self.state = next;
        self.changes.touch(GameField::State);
        Ok(next)
    }

    /// Add a player and mark it for insertion on the next save.
    ///
    /// Stamps the player with this game's id and returns its position in
    /// [`GameSanta::players`].
    ///
    /// # Errors
    ///
    /// - [`GameError::NotPersisted`] if the game has no id yet
    /// - [`GameError::InvalidTransition`] if registration is not open
    /// - [`GameError::AlreadyMember`] if the user already joined
    pub fn add_player(&mut self, mut player: Player) -> Result<usize, GameError> {
        let Some(game_id) = self.id else {
            return Err(GameError::NotPersisted);
        };
        if !self.state.is_open_for_registration() {
            return Err(GameError::InvalidTransition {
                state: self.state,
                action: GameAction::Join,
            });
        }
        if self.is_member(player.telegram_id) {
            return Err(GameError::AlreadyMember {
                telegram_id: player.telegram_id,
            });
        }

        player.game_id = Some(game_id);
        player.recipient = None;
        let seat = self.players.len();
        self.players.push(player);
        self.changes.player_added(seat);
        Ok(seat)
    }

    /// Assign every player a recipient using the thread-local RNG.
    ///
    /// See [`GameSanta::shuffle_with`].
    ///
    /// # Errors
    ///
    /// Same as [`GameSanta::shuffle_with`].
    pub fn shuffle(&mut self) -> Result<(), GameError> {
        self.shuffle_with(&mut rand::rng())
    }

    /// Assign every player a recipient so that the gift graph is one cycle.
    ///
    /// Players are put in a uniformly random circular order and each one
    /// gives to its predecessor in that order. With two or more players
    /// this can never assign a player to themself, and following the
    /// recipients from anyone visits everyone before coming back.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidTransition`] if the game is already allocated
    /// - [`GameError::NotEnoughPlayers`] with fewer than two players
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if !self.state.is_editable() {
            return Err(GameError::InvalidTransition {
                state: self.state,
                action: GameAction::Shuffle,
            });
        }
        let count = self.players.len();
        if count < 2 {
            return Err(GameError::NotEnoughPlayers { count });
        }

        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(rng);
        let mut predecessors = order.clone();
        predecessors.rotate_right(1);

        for (&giver, &recipient) in order.iter().zip(&predecessors) {
            if let Some(player) = self.players.get_mut(giver) {
                player.recipient = Some(recipient);
            }
        }

        self.state = GameState::Allocated;
        self.changes.touch(GameField::State);
        self.changes.shuffled();
        Ok(())
    }

    // =========================================================================
    // Storage hooks
    // =========================================================================

    /// Record the id storage generated on first save.
    pub const fn assign_id(&mut self, id: GameId) {
        self.id = Some(id);
    }

    /// Record the id storage generated for the player at `seat`.
    pub fn assign_player_id(&mut self, seat: usize, id: PlayerId) {
        if let Some(player) = self.players.get_mut(seat) {
            player.id = Some(id);
        }
    }

    /// Forget recorded changes after they have been written.
    pub fn mark_saved(&mut self) {
        self.changes.clear();
    }
}

/// Equality over stored state; the change envelope is ignored.
impl PartialEq for GameSanta {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.state == other.state
            && self.players == other.players
            && self.initiator_id == other.initiator_id
            && self.initiator_fullname == other.initiator_fullname
            && self.title == other.title
            && self.description == other.description
            && self.date_finish == other.date_finish
    }
}

impl Eq for GameSanta {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn saved_game() -> GameSanta {
        let mut game = GameSanta::new(42, "Organizer");
        game.set_title("Office Party");
        game.assign_id(GameId::new());
        game.mark_saved();
        game
    }

    fn game_with_players(count: usize) -> GameSanta {
        let mut game = saved_game();
        for n in 0..count {
            let telegram_id = i64::try_from(n).unwrap_or(i64::MAX);
            game.add_player(Player::new(telegram_id, format!("Player {n}"), None))
                .ok();
        }
        game
    }

    /// Follow recipients from seat 0 and return the seats visited.
    fn walk_cycle(game: &GameSanta) -> Vec<usize> {
        let mut visited = Vec::new();
        let mut seat = 0;
        loop {
            visited.push(seat);
            match game.players().get(seat).and_then(Player::recipient_seat) {
                Some(0) | None => break,
                Some(next) => seat = next,
            }
            if visited.len() > game.players().len() {
                break;
            }
        }
        visited
    }

    #[test]
    fn new_game_is_open_and_unsaved() {
        let game = GameSanta::new(7, "Santa");
        assert_eq!(game.id(), None);
        assert_eq!(game.state(), GameState::RegistrationOpen);
        assert!(game.players().is_empty());
        assert_eq!(game.changes().fields().len(), 3);
    }

    #[test]
    fn setters_record_their_field() {
        let mut game = saved_game();
        game.set_description("Bring cookies");
        game.set_date_finish(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap_or_default());

        let fields: Vec<GameField> = game.changes().fields().iter().copied().collect();
        assert_eq!(fields, vec![GameField::Description, GameField::DateFinish]);
        assert_eq!(game.description(), "Bring cookies");
    }

    #[test]
    fn writing_same_value_still_counts() {
        let mut game = saved_game();
        game.set_title("Office Party");
        assert!(game.changes().fields().contains(&GameField::Title));
    }

    #[test]
    fn toggle_flips_between_registration_states() {
        let mut game = saved_game();
        assert_eq!(game.toggle_registration(), Ok(GameState::RegistrationClose));
        assert_eq!(game.toggle_registration(), Ok(GameState::RegistrationOpen));
        assert!(game.changes().fields().contains(&GameField::State));
    }

    #[test]
    fn toggle_after_allocation_is_rejected() {
        let mut game = game_with_players(3);
        assert!(game.shuffle().is_ok());
        game.mark_saved();

        let result = game.toggle_registration();
        assert_eq!(
            result,
            Err(GameError::InvalidTransition {
                state: GameState::Allocated,
                action: GameAction::ToggleRegistration,
            })
        );
        assert_eq!(game.state(), GameState::Allocated);
        assert!(game.changes().is_empty());
    }

    #[test]
    fn add_player_requires_saved_game() {
        let mut game = GameSanta::new(1, "Organizer");
        let result = game.add_player(Player::new(2, "Bob", None));
        assert_eq!(result, Err(GameError::NotPersisted));
        assert!(game.players().is_empty());
    }

    #[test]
    fn add_player_stamps_game_and_tracks_insert() {
        let mut game = saved_game();
        let seat = game.add_player(Player::new(5, "Eve", Some("eve".to_owned())));
        assert_eq!(seat, Ok(0));
        assert_eq!(game.players().first().and_then(|p| p.game_id), game.id());
        assert!(game.changes().new_players().contains(&0));
        assert!(game.is_member(5));
        assert!(game.involves(42));
        assert!(!game.involves(6));
    }

    #[test]
    fn duplicate_member_is_rejected() {
        let mut game = saved_game();
        assert!(game.add_player(Player::new(5, "Eve", None)).is_ok());
        let result = game.add_player(Player::new(5, "Eve again", None));
        assert_eq!(result, Err(GameError::AlreadyMember { telegram_id: 5 }));
        assert_eq!(game.players().len(), 1);
    }

    #[test]
    fn joining_closed_registration_is_rejected() {
        let mut game = saved_game();
        assert!(game.toggle_registration().is_ok());
        let result = game.add_player(Player::new(5, "Eve", None));
        assert_eq!(
            result,
            Err(GameError::InvalidTransition {
                state: GameState::RegistrationClose,
                action: GameAction::Join,
            })
        );
    }

    #[test]
    fn shuffle_forms_single_cycle_for_every_size() {
        let mut rng = StdRng::seed_from_u64(2024);
        for count in 2..=25 {
            for _ in 0..20 {
                let mut game = game_with_players(count);
                assert!(game.shuffle_with(&mut rng).is_ok());

                for seat in 0..count {
                    let recipient = game.players().get(seat).and_then(Player::recipient_seat);
                    assert!(recipient.is_some(), "seat {seat} has no recipient");
                    assert_ne!(recipient, Some(seat), "seat {seat} gives to itself");
                }

                let visited = walk_cycle(&game);
                let unique: BTreeSet<usize> = visited.iter().copied().collect();
                assert_eq!(visited.len(), count);
                assert_eq!(unique.len(), count);
            }
        }
    }

    #[test]
    fn shuffle_marks_allocation() {
        let mut game = game_with_players(2);
        game.mark_saved();
        assert!(game.shuffle().is_ok());
        assert_eq!(game.state(), GameState::Allocated);
        assert!(game.changes().is_shuffled());
        assert!(game.changes().fields().contains(&GameField::State));
    }

    #[test]
    fn shuffle_with_too_few_players_is_rejected() {
        for count in 0..2 {
            let mut game = game_with_players(count);
            game.mark_saved();
            assert_eq!(game.shuffle(), Err(GameError::NotEnoughPlayers { count }));
            assert_eq!(game.state(), GameState::RegistrationOpen);
            assert!(game.changes().is_empty());
            assert_eq!(game.assignments().count(), 0);
        }
    }

    #[test]
    fn reshuffle_after_allocation_is_rejected() {
        let mut game = game_with_players(4);
        assert!(game.shuffle().is_ok());
        let before: Vec<Option<usize>> =
            game.players().iter().map(Player::recipient_seat).collect();

        assert_eq!(
            game.shuffle(),
            Err(GameError::InvalidTransition {
                state: GameState::Allocated,
                action: GameAction::Shuffle,
            })
        );
        let after: Vec<Option<usize>> =
            game.players().iter().map(Player::recipient_seat).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn shuffle_from_closed_registration_is_allowed() {
        let mut game = game_with_players(3);
        assert!(game.toggle_registration().is_ok());
        assert!(game.shuffle().is_ok());
        assert_eq!(game.state(), GameState::Allocated);
    }

    #[test]
    fn office_party_forms_three_cycle() {
        let mut game = saved_game();
        for (telegram_id, name) in [(1, "A"), (2, "B"), (3, "C")] {
            assert!(game.add_player(Player::new(telegram_id, name, None)).is_ok());
        }
        assert!(game.shuffle().is_ok());

        let pairs: Vec<(i64, i64)> = game
            .assignments()
            .map(|(giver, recipient)| (giver.telegram_id, recipient.telegram_id))
            .collect();
        assert_eq!(pairs.len(), 3);
        let recipients: BTreeSet<i64> = pairs.iter().map(|&(_, r)| r).collect();
        assert_eq!(recipients, BTreeSet::from([1, 2, 3]));
        assert!(pairs.iter().all(|(giver, recipient)| giver != recipient));
        assert_eq!(walk_cycle(&game).len(), 3);
        assert_eq!(game.state(), GameState::Allocated);
    }

    #[test]
    fn from_parts_resolves_recipients_by_id() {
        let game_id = GameId::new();
        let parts = GameParts {
            id: game_id,
            state: GameState::Allocated,
            players: vec![
                LoadedPlayer {
                    player: Player::stored(PlayerId(10), 1, "A", None, game_id),
                    recipient_id: Some(PlayerId(11)),
                },
                LoadedPlayer {
                    player: Player::stored(PlayerId(11), 2, "B", None, game_id),
                    recipient_id: Some(PlayerId(10)),
                },
            ],
            initiator_id: 1,
            initiator_fullname: "A".to_owned(),
            title: "T".to_owned(),
            description: "D".to_owned(),
            date_finish: None,
        };

        let game = GameSanta::from_parts(parts);
        assert!(game.changes().is_empty());
        assert_eq!(game.recipient_of(0).map(|p| p.telegram_id), Some(2));
        assert_eq!(game.recipient_ref(1), Some(PlayerId(10)));
    }

    #[test]
    fn from_parts_drops_foreign_recipient() {
        let game_id = GameId::new();
        let parts = GameParts {
            id: game_id,
            state: GameState::Allocated,
            players: vec![LoadedPlayer {
                player: Player::stored(PlayerId(10), 1, "A", None, game_id),
                recipient_id: Some(PlayerId(99)),
            }],
            initiator_id: 1,
            initiator_fullname: "A".to_owned(),
            title: String::new(),
            description: String::new(),
            date_finish: None,
        };

        let game = GameSanta::from_parts(parts);
        assert_eq!(game.recipient_of(0), None);
    }

    #[test]
    fn equality_ignores_envelope() {
        let mut left = saved_game();
        let right = left.clone();
        left.set_title("Office Party");
        assert_eq!(left, right);
    }
}
