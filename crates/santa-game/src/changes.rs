//! Change-tracking envelope attached to every [`GameSanta`](crate::GameSanta).
//!
//! The envelope records three independent facts since the aggregate was
//! loaded or created:
//!
//! - which persisted fields were written (any write counts, even one that
//!   stores an equal value),
//! - which players were added and are not yet in storage,
//! - whether recipients were (re)assigned.
//!
//! The aggregate only ever writes to it and never branches on its
//! contents. The persistence layer only ever reads it.

use std::collections::BTreeSet;

use santa_types::GameField;

/// Pending changes of a game aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    fields: BTreeSet<GameField>,
    new_players: BTreeSet<usize>,
    shuffled: bool,
}

impl Changes {
    /// Envelope for an aggregate that has never been stored.
    ///
    /// The identity fields are pre-marked so that the first save has a
    /// row to insert.
    pub(crate) fn fresh() -> Self {
        Self {
            fields: BTreeSet::from([
                GameField::State,
                GameField::InitiatorId,
                GameField::InitiatorFullname,
            ]),
            ..Self::default()
        }
    }

    pub(crate) fn touch(&mut self, field: GameField) {
        self.fields.insert(field);
    }

    pub(crate) fn player_added(&mut self, seat: usize) {
        self.new_players.insert(seat);
    }

    pub(crate) const fn shuffled(&mut self) {
        self.shuffled = true;
    }

    pub(crate) fn clear(&mut self) {
        self.fields.clear();
        self.new_players.clear();
        self.shuffled = false;
    }

    /// Fields written since load, in column order.
    pub const fn fields(&self) -> &BTreeSet<GameField> {
        &self.fields
    }

    /// Positions in [`GameSanta::players`](crate::GameSanta::players) of
    /// players that still need to be inserted, in join order.
    pub const fn new_players(&self) -> &BTreeSet<usize> {
        &self.new_players
    }

    /// Whether recipients were assigned since load.
    pub const fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Whether a save would have nothing to write.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.new_players.is_empty() && !self.shuffled
    }
}
