//! Deck shuffling and dealing.
//!
//! War only compares cards, so suits are not modeled: a deck is the
//! multiset of ranks 2..=14 with four copies of each, 52 cards total.
//!
//! ## Shuffling
//!
//! [`shuffle`] builds the full multiset and repeatedly moves a uniformly
//! random remaining card to the output, swap-removing its slot with the
//! last remaining slot so removal stays O(1). Every ordering of the 52
//! physical cards is equally likely, which gives each rank permutation
//! its correct relative frequency.
//!
//! ## Dealing
//!
//! [`deal`] alternates cards between two hands, second hand first: the
//! card at index 0 goes to hand B, index 1 to hand A, and so on.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::GameRng;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// Number of cards each player holds after the deal.
pub const HAND_SIZE: usize = DECK_SIZE / 2;

/// Copies of each rank in a deck (one per suit).
pub const COPIES_PER_RANK: usize = 4;

/// A card's comparison value: 2 through 14, with 14 as Ace-high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
    /// Lowest rank in the deck.
    pub const MIN: u8 = 2;

    /// Highest rank in the deck (Ace).
    pub const MAX: u8 = 14;

    /// Create a rank, returning `None` outside 2..=14.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Get the comparison value (2..=14).
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Iterate over the thirteen distinct ranks, lowest first.
    pub fn all() -> impl Iterator<Item = Rank> {
        (Self::MIN..=Self::MAX).map(Rank)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Produce a full deck in uniformly random order.
///
/// The caller supplies the RNG; the engine forks a fresh generator per
/// call so concurrent shuffles never share a stream.
#[must_use]
pub fn shuffle(rng: &mut GameRng) -> Vec<Rank> {
    let mut remaining: Vec<Rank> = Vec::with_capacity(DECK_SIZE);
    for rank in Rank::all() {
        for _ in 0..COPIES_PER_RANK {
            remaining.push(rank);
        }
    }

    let mut shuffled = Vec::with_capacity(DECK_SIZE);
    while !remaining.is_empty() {
        let pos = rng.gen_range_usize(0..remaining.len());
        // swap_remove backfills the hole with the last remaining card
        shuffled.push(remaining.swap_remove(pos));
    }

    shuffled
}

/// Split a shuffled deck into two hands by strict alternation.
///
/// Hand B receives the first card (index 0), hand A the second, and so
/// on. For any input, `a.len() + b.len() == deck.len()` and no card is
/// dropped or duplicated.
#[must_use]
pub fn deal(deck: &[Rank]) -> (Vector<Rank>, Vector<Rank>) {
    let mut hand_a = Vector::new();
    let mut hand_b = Vector::new();

    for (i, &card) in deck.iter().enumerate() {
        if i % 2 == 0 {
            hand_b.push_back(card);
        } else {
            hand_a.push_back(card);
        }
    }

    (hand_a, hand_b)
}
