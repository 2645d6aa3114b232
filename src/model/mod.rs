//! Persisted data model: players, hands, matches.
//!
//! ## Lifecycle
//!
//! A match moves through four states, derived from its optional fields
//! rather than stored separately so the persisted document can never
//! disagree with the state machine:
//!
//! - `Created`: player two absent, open for joining
//! - `Joined`: both players seated, not yet dealt
//! - `InProgress`: dealt (`start_ms` set), no winner yet
//! - `Ended`: `winner` and `end_ms` set together, terminal
//!
//! ## Card conservation
//!
//! From the moment a match starts until it ends, the two hands and the
//! pile together always hold all 52 cards. [`Match::total_cards`] exists
//! so callers and tests can assert this.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{MatchId, PlayerId};
use crate::deck::Rank;

/// A persistent player with an all-time win counter.
///
/// Created on first reference when no id is supplied; the engine only
/// ever increments `wins` and never deletes a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier assigned by the player repository on insert.
    pub id: PlayerId,
    /// All-time number of matches won.
    pub wins: u32,
}

impl Player {
    /// Create a new player. The id is overwritten by the repository on
    /// insert.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: PlayerId::new(0),
            wins: 0,
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// One player's side of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    /// The seated player.
    pub player_id: PlayerId,
    /// Cards held, front = next card to play.
    pub cards: Vector<Rank>,
    /// The card currently face up for this round, if any.
    pub current_card: Option<Rank>,
}

impl Hand {
    /// Seat a player with no cards yet.
    #[must_use]
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            cards: Vector::new(),
            current_card: None,
        }
    }
}

/// Derived state machine position of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    /// Player two absent, open for joining.
    Created,
    /// Both players seated, not yet dealt.
    Joined,
    /// Dealt and running.
    InProgress,
    /// Winner decided, terminal.
    Ended,
}

/// Caller-facing status as serialized in views. Note the historical
/// naming: `Started` means "created, waiting for a second player".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Started,
    InProgress,
    Ended,
}

/// A match document as held by the match repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Identifier assigned by the match repository on insert.
    pub id: MatchId,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_ms: u64,
    /// The creator's side, always present.
    pub player_one: Hand,
    /// The joiner's side; `None` means the match is open.
    pub player_two: Option<Hand>,
    /// Winning player, set together with `end_ms`, exactly once.
    pub winner: Option<PlayerId>,
    /// Set when the match is dealt.
    pub start_ms: Option<u64>,
    /// Set when the match ends; never cleared.
    pub end_ms: Option<u64>,
    /// Cards each player plays per draw this round; 1 normally, 2 after
    /// a war.
    pub cards_to_play: u32,
    /// Cards wagered in the active round, not yet awarded.
    pub pile: Vector<Rank>,
}

impl Match {
    /// Create a match with only player one seated. The id is overwritten
    /// by the repository on insert.
    #[must_use]
    pub fn new(player_one: PlayerId, created_ms: u64) -> Self {
        Self {
            id: MatchId::new(0),
            created_ms,
            player_one: Hand::new(player_one),
            player_two: None,
            winner: None,
            start_ms: None,
            end_ms: None,
            cards_to_play: 1,
            pile: Vector::new(),
        }
    }

    /// Derive the state machine position from the optional fields.
    #[must_use]
    pub fn state(&self) -> MatchState {
        if self.player_two.is_none() {
            MatchState::Created
        } else if self.start_ms.is_none() {
            MatchState::Joined
        } else if self.end_ms.is_none() {
            MatchState::InProgress
        } else {
            MatchState::Ended
        }
    }

    /// Derive the caller-facing status.
    #[must_use]
    pub fn status(&self) -> MatchStatus {
        if self.player_two.is_none() {
            MatchStatus::Started
        } else if self.end_ms.is_some() {
            MatchStatus::Ended
        } else {
            MatchStatus::InProgress
        }
    }

    /// Check whether `player` occupies either seat.
    #[must_use]
    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.hand_of(player).is_some()
    }

    /// Get the hand seated by `player`, if any.
    #[must_use]
    pub fn hand_of(&self, player: PlayerId) -> Option<&Hand> {
        if self.player_one.player_id == player {
            Some(&self.player_one)
        } else {
            self.player_two
                .as_ref()
                .filter(|hand| hand.player_id == player)
        }
    }

    /// Total cards across both hands and the pile.
    ///
    /// Equals 52 at all times between start and end of a match.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.player_one.cards.len()
            + self.player_two.as_ref().map_or(0, |hand| hand.cards.len())
            + self.pile.len()
    }
}
