//! Read projections produced by the engine.
//!
//! Views carry counts and face-up cards, never the hidden card order.
//! On the wire `current_card` keeps the legacy 0 sentinel for "no card
//! face up"; inside the model that is `Option<Rank>`.

use serde::{Deserialize, Serialize};

use crate::core::{MatchId, PlayerId};
use crate::deck::Rank;
use crate::model::{Hand, Match, MatchStatus};

/// Public projection of one seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandView {
    /// The seated player, `None` for an unfilled seat.
    pub player_id: Option<PlayerId>,
    /// Cards remaining in this hand.
    pub cards_left: usize,
    /// Rank face up this round, 0 if none.
    pub current_card: u8,
}

impl HandView {
    fn of(hand: &Hand) -> Self {
        Self {
            player_id: Some(hand.player_id),
            cards_left: hand.cards.len(),
            current_card: hand.current_card.map_or(0, Rank::value),
        }
    }

    fn empty() -> Self {
        Self {
            player_id: None,
            cards_left: 0,
            current_card: 0,
        }
    }

    fn of_seat(seat: Option<&Hand>) -> Self {
        seat.map_or_else(Self::empty, Self::of)
    }
}

/// Neutral summary of a match, fit for polling by anyone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub created_ms: u64,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub status: MatchStatus,
    pub winner_player_id: Option<PlayerId>,
    pub cards_on_pile: usize,
    pub player_one: HandView,
    pub player_two: HandView,
}

impl MatchSummary {
    pub(crate) fn of(doc: &Match) -> Self {
        Self {
            match_id: doc.id,
            created_ms: doc.created_ms,
            start_ms: doc.start_ms,
            end_ms: doc.end_ms,
            status: doc.status(),
            winner_player_id: doc.winner,
            cards_on_pile: doc.pile.len(),
            player_one: HandView::of(&doc.player_one),
            player_two: HandView::of_seat(doc.player_two.as_ref()),
        }
    }
}

/// A [`MatchSummary`] seen from one seat, carrying the requester's own
/// side explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchView {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub your_player_id: PlayerId,
    pub cards_left: usize,
    pub current_card: u8,
}

impl PlayerMatchView {
    pub(crate) fn of(doc: &Match, side: &Hand) -> Self {
        Self {
            summary: MatchSummary::of(doc),
            your_player_id: side.player_id,
            cards_left: side.cards.len(),
            current_card: side.current_card.map_or(0, Rank::value),
        }
    }
}

/// One entry in the open-match listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenMatchSummary {
    pub match_id: MatchId,
    pub created_ms: u64,
    /// The waiting creator a joiner would face.
    pub opponent_player_id: PlayerId,
}

impl OpenMatchSummary {
    pub(crate) fn of(doc: &Match) -> Self {
        Self {
            match_id: doc.id,
            created_ms: doc.created_ms,
            opponent_player_id: doc.player_one.player_id,
        }
    }
}

/// Public projection of a persistent player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub wins: u32,
}
