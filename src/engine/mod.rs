//! The match engine: the state machine behind every operation.
//!
//! One engine instance serves any number of concurrent callers. Every
//! mutating operation is a read-validate-compute-commit unit: load the
//! match and its version, validate preconditions against that snapshot,
//! compute the new document, and commit with a version-conditional
//! update. A conflict means another caller committed in between; the
//! operation retries from a fresh read a bounded number of times.
//!
//! ## Round resolution
//!
//! `draw_card` moves the caller's front `cards_to_play` cards onto the
//! pile and turns the last one face up. Once both seats have a face-up
//! card the round resolves: the higher rank takes the whole pile, equal
//! ranks are a war (pile stays, next round both players play 2 cards).
//! A round winner whose opponent ran out of cards wins the match; the
//! winning commit sets `winner` and `end_ms` together, and only that
//! commit increments the player's all-time win counter.

pub mod views;

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{Clock, GameRng, MatchId, PlayerId, SystemClock};
use crate::deck;
use crate::model::{Hand, Match, MatchState, Player};
use crate::store::{MatchStore, PlayerStore, StoreError, Version};

pub use views::{HandView, MatchSummary, OpenMatchSummary, PlayerMatchView, PlayerSummary};

/// Default bound on conflict retries before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// User-facing engine failures.
///
/// `NotFound` and `InvalidState` are expected outcomes carrying a
/// descriptive message. Store conflicts are retried internally and only
/// surface as `Internal` once retries are exhausted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The match or player id does not resolve.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation violates a precondition of the current match state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Storage failure or conflict-retry exhaustion.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            // conflicts are handled inside the retry loop; one escaping
            // via `?` means the loop could not absorb it
            StoreError::Conflict => {
                EngineError::Internal("conflicting write could not be absorbed".to_string())
            }
            StoreError::NotFound => {
                EngineError::NotFound("document vanished during the operation".to_string())
            }
            StoreError::Backend(msg) => EngineError::Internal(msg),
        }
    }
}

/// What a committed draw did, for logging and the win-counter side
/// effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoundOutcome {
    /// Caller played; waiting for the opponent.
    Waiting,
    /// Both played equal ranks; stakes escalate.
    War,
    /// Round resolved, match continues.
    RoundWon(PlayerId),
    /// Round resolved and the loser is out of cards.
    MatchWon(PlayerId),
}

/// Builder for a [`MatchEngine`].
pub struct MatchEngineBuilder {
    matches: Arc<dyn MatchStore>,
    players: Arc<dyn PlayerStore>,
    clock: Arc<dyn Clock>,
    rng: GameRng,
    max_retries: u32,
}

impl MatchEngineBuilder {
    /// Override the time source (tests pin time with `ManualClock`).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the master RNG for deterministic shuffles.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = GameRng::new(seed);
        self
    }

    /// Override the conflict-retry bound.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        assert!(max_retries >= 1, "at least one attempt is required");
        self.max_retries = max_retries;
        self
    }

    /// Build the engine.
    #[must_use]
    pub fn build(self) -> MatchEngine {
        MatchEngine {
            matches: self.matches,
            players: self.players,
            clock: self.clock,
            rng: Mutex::new(self.rng),
            max_retries: self.max_retries,
        }
    }
}

/// The sole owner of game-rule logic.
///
/// Holds the repositories, a clock, and a mutex-guarded master RNG that
/// is forked once per shuffle.
pub struct MatchEngine {
    matches: Arc<dyn MatchStore>,
    players: Arc<dyn PlayerStore>,
    clock: Arc<dyn Clock>,
    rng: Mutex<GameRng>,
    max_retries: u32,
}

impl MatchEngine {
    /// Create an engine with the system clock, an entropy-seeded RNG,
    /// and the default retry bound.
    #[must_use]
    pub fn new(matches: Arc<dyn MatchStore>, players: Arc<dyn PlayerStore>) -> Self {
        Self::builder(matches, players).build()
    }

    /// Start building an engine with custom clock, seed, or retry bound.
    #[must_use]
    pub fn builder(matches: Arc<dyn MatchStore>, players: Arc<dyn PlayerStore>) -> MatchEngineBuilder {
        MatchEngineBuilder {
            matches,
            players,
            clock: Arc::new(SystemClock),
            rng: GameRng::from_entropy(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    // === Operations ===

    /// Create a new match with the requester seated as player one.
    ///
    /// With no `requested_player` a fresh player is created; a supplied
    /// id must resolve or the call fails with `NotFound`.
    pub fn create_match(
        &self,
        requested_player: Option<PlayerId>,
    ) -> Result<PlayerMatchView, EngineError> {
        debug!(?requested_player, "create_match");

        let player = self.resolve_or_create_player(
            requested_player,
            "player does not exist; pass no id to create a new one",
        )?;

        let mut doc = Match::new(player.id, self.clock.now_ms());
        let id = self.matches.insert(doc.clone())?;
        doc.id = id;

        info!(match_id = id.raw(), player_id = player.id.raw(), "match created");
        Ok(PlayerMatchView::of(&doc, &doc.player_one))
    }

    /// Join an open match as player two.
    ///
    /// Self-join is rejected by identity only: joining with no
    /// requested id always yields a fresh identity and goes through.
    pub fn join_match(
        &self,
        match_id: MatchId,
        requested_player: Option<PlayerId>,
    ) -> Result<PlayerMatchView, EngineError> {
        debug!(match_id = match_id.raw(), ?requested_player, "join_match");

        // Fail fast on a full match before minting an anonymous player.
        let (snapshot, _) = self.find_match(match_id, "could not find match")?;
        Self::check_open(&snapshot)?;

        let player = self.resolve_or_create_player(requested_player, "player does not exist")?;

        let doc = self.with_match(match_id, "could not find match", |doc| {
            Self::check_open(doc)?;
            if doc.player_one.player_id == player.id {
                return Err(EngineError::InvalidState(
                    "cannot play against yourself; join with no player id to get a fresh one"
                        .to_string(),
                ));
            }
            doc.player_two = Some(Hand::new(player.id));
            Ok(())
        })?;

        info!(match_id = match_id.raw(), player_id = player.id.raw(), "player joined");

        let side = doc
            .hand_of(player.id)
            .ok_or_else(|| EngineError::Internal("joined seat missing after commit".to_string()))?;
        Ok(PlayerMatchView::of(&doc, side))
    }

    /// Deal the cards and start a joined match.
    ///
    /// Either seated player may start; the deck is shuffled with a
    /// freshly forked RNG and dealt alternately, player two first.
    pub fn start_match(
        &self,
        match_id: MatchId,
        requesting_player: PlayerId,
    ) -> Result<PlayerMatchView, EngineError> {
        debug!(match_id = match_id.raw(), player_id = requesting_player.raw(), "start_match");

        let not_found = format!("match {match_id} does not exist, create or join one first");
        let doc = self.with_match(match_id, &not_found, |doc| {
            if doc.player_two.is_none() {
                return Err(EngineError::InvalidState("need another player".to_string()));
            }
            if !doc.is_seated(requesting_player) {
                return Err(EngineError::InvalidState(
                    "not allowed to start this match, both spots are already taken".to_string(),
                ));
            }
            if doc.start_ms.is_some() {
                return Err(EngineError::InvalidState(
                    "match is already in progress, draw a card once both players have played"
                        .to_string(),
                ));
            }
            if doc.end_ms.is_some() {
                return Err(EngineError::InvalidState(
                    "match has already finished".to_string(),
                ));
            }

            let mut rng = self.rng.lock().fork();
            let shuffled = deck::shuffle(&mut rng);
            let (hand_a, hand_b) = deck::deal(&shuffled);

            doc.player_one.cards = hand_a;
            if let Some(two) = doc.player_two.as_mut() {
                two.cards = hand_b;
            }
            doc.start_ms = Some(self.clock.now_ms());
            Ok(())
        })?;

        info!(match_id = match_id.raw(), "match started");

        let side = doc
            .hand_of(requesting_player)
            .ok_or_else(|| EngineError::Internal("requesting seat missing after commit".to_string()))?;
        Ok(PlayerMatchView::of(&doc, side))
    }

    /// Play the caller's hand for this round.
    ///
    /// The partial state (hands plus pile) is committed even when the
    /// opponent has not drawn yet, so a round can straddle two calls.
    pub fn draw_card(
        &self,
        match_id: MatchId,
        user_id: PlayerId,
    ) -> Result<PlayerMatchView, EngineError> {
        debug!(match_id = match_id.raw(), player_id = user_id.raw(), "draw_card");

        const NOT_FOUND: &str = "match does not exist or you are not a player of the provided match";

        let mut outcome = RoundOutcome::Waiting;
        let doc = self.with_match(match_id, NOT_FOUND, |doc| {
            outcome = Self::apply_draw(doc, user_id, self.clock.now_ms())?;
            Ok(())
        })?;

        match outcome {
            RoundOutcome::Waiting => {}
            RoundOutcome::War => {
                debug!(match_id = match_id.raw(), pile = doc.pile.len(), "war, stakes escalate");
            }
            RoundOutcome::RoundWon(winner) => {
                debug!(match_id = match_id.raw(), winner = winner.raw(), "round resolved");
            }
            RoundOutcome::MatchWon(winner) => {
                // Only the commit that first set end_ms reaches here, so
                // the counter moves exactly once per match.
                self.players.increment_wins(winner)?;
                info!(match_id = match_id.raw(), winner = winner.raw(), "match ended");
            }
        }

        let side = doc
            .hand_of(user_id)
            .ok_or_else(|| EngineError::Internal("caller's seat missing after commit".to_string()))?;
        Ok(PlayerMatchView::of(&doc, side))
    }

    /// Neutral match summary.
    pub fn get_match(&self, match_id: MatchId) -> Result<MatchSummary, EngineError> {
        let not_found = format!("could not find a match with provided id: {match_id}");
        let (doc, _) = self.find_match(match_id, &not_found)?;
        Ok(MatchSummary::of(&doc))
    }

    /// Match summary seen from `user_id`'s seat.
    ///
    /// An id seated in neither spot falls back to player two's seat if
    /// filled, else player one's, mirroring the neutral projection.
    pub fn get_match_for(
        &self,
        match_id: MatchId,
        user_id: PlayerId,
    ) -> Result<PlayerMatchView, EngineError> {
        let (doc, _) = self.find_match(match_id, "could not find match")?;

        let side = if doc.player_one.player_id == user_id {
            &doc.player_one
        } else {
            doc.player_two.as_ref().unwrap_or(&doc.player_one)
        };
        Ok(PlayerMatchView::of(&doc, side))
    }

    /// List matches still waiting for a second player.
    pub fn get_open_matches(&self) -> Result<Vec<OpenMatchSummary>, EngineError> {
        let open = self.matches.find_open()?;
        Ok(open.iter().map(OpenMatchSummary::of).collect())
    }

    /// Look up a player's all-time record.
    pub fn get_player(&self, player_id: PlayerId) -> Result<PlayerSummary, EngineError> {
        let player = self
            .players
            .find(player_id)?
            .ok_or_else(|| EngineError::NotFound(format!("could not find player with id: {player_id}")))?;
        Ok(PlayerSummary {
            id: player.id,
            wins: player.wins,
        })
    }

    // === Internals ===

    fn resolve_or_create_player(
        &self,
        requested: Option<PlayerId>,
        not_found: &str,
    ) -> Result<Player, EngineError> {
        match requested {
            Some(id) => self
                .players
                .find(id)?
                .ok_or_else(|| EngineError::NotFound(not_found.to_string())),
            None => {
                let mut player = Player::new();
                let id = self.players.insert(player.clone())?;
                player.id = id;
                info!(player_id = id.raw(), "player created");
                Ok(player)
            }
        }
    }

    fn find_match(&self, id: MatchId, not_found: &str) -> Result<(Match, Version), EngineError> {
        self.matches
            .find(id)?
            .ok_or_else(|| EngineError::NotFound(not_found.to_string()))
    }

    /// Read-validate-compute-commit with bounded conflict retries.
    ///
    /// `apply` runs against a private clone of the stored document;
    /// nothing is visible to other callers unless the conditional
    /// update commits. Returns the committed document.
    fn with_match<F>(&self, id: MatchId, not_found: &str, mut apply: F) -> Result<Match, EngineError>
    where
        F: FnMut(&mut Match) -> Result<(), EngineError>,
    {
        for attempt in 0..self.max_retries {
            let (mut doc, version) = self.find_match(id, not_found)?;
            apply(&mut doc)?;

            match self.matches.update(id, version, doc.clone()) {
                Ok(()) => return Ok(doc),
                Err(StoreError::Conflict) => {
                    warn!(match_id = id.raw(), attempt, "concurrent write detected, retrying from a fresh read");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::Internal(format!(
            "update of {id} kept conflicting after {} attempts",
            self.max_retries
        )))
    }

    fn check_open(doc: &Match) -> Result<(), EngineError> {
        match doc.state() {
            MatchState::Created => Ok(()),
            MatchState::Ended => Err(EngineError::InvalidState(
                "match has already finished".to_string(),
            )),
            MatchState::Joined | MatchState::InProgress => Err(EngineError::InvalidState(
                "match is already in progress, start or join a different one".to_string(),
            )),
        }
    }

    /// Run one draw against a snapshot, mutating it in place.
    fn apply_draw(doc: &mut Match, user_id: PlayerId, now_ms: u64) -> Result<RoundOutcome, EngineError> {
        if !doc.is_seated(user_id) {
            return Err(EngineError::NotFound(
                "match does not exist or you are not a player of the provided match".to_string(),
            ));
        }
        match doc.state() {
            MatchState::Created | MatchState::Joined => {
                return Err(EngineError::InvalidState(
                    "match needs to be started first".to_string(),
                ));
            }
            MatchState::Ended => {
                return Err(EngineError::InvalidState(
                    "match has already finished".to_string(),
                ));
            }
            MatchState::InProgress => {}
        }

        // InProgress guarantees a second seat; take it out so both
        // hands can be borrowed at once, and put it back before
        // returning Ok. Error paths discard the snapshot entirely.
        let mut two = doc
            .player_two
            .take()
            .ok_or_else(|| EngineError::Internal("started match missing second seat".to_string()))?;
        let (current, opponent) = if doc.player_one.player_id == user_id {
            (&mut doc.player_one, &mut two)
        } else {
            (&mut two, &mut doc.player_one)
        };

        if current.current_card.is_some() {
            return Err(EngineError::InvalidState(
                "you've played your card already".to_string(),
            ));
        }
        if current.cards.is_empty() {
            return Err(EngineError::InvalidState(
                "no cards left to play, wait for the match to resolve".to_string(),
            ));
        }

        // A hand shorter than cards_to_play plays everything it has.
        let count = (doc.cards_to_play as usize).min(current.cards.len());
        let played = current.cards.slice(..count);
        current.current_card = played.last().copied();
        doc.pile.append(played);

        let outcome = match (current.current_card, opponent.current_card) {
            (Some(mine), Some(theirs)) if mine == theirs => {
                current.current_card = None;
                opponent.current_card = None;
                doc.cards_to_play = 2;
                RoundOutcome::War
            }
            (Some(mine), Some(theirs)) => {
                let (round_winner, round_loser) = if mine > theirs {
                    (&mut *current, &mut *opponent)
                } else {
                    (&mut *opponent, &mut *current)
                };

                round_winner.cards.append(std::mem::take(&mut doc.pile));
                round_winner.current_card = None;
                round_loser.current_card = None;
                doc.cards_to_play = 1;

                if round_loser.cards.is_empty() {
                    let winner = round_winner.player_id;
                    doc.winner = Some(winner);
                    doc.end_ms = Some(now_ms);
                    RoundOutcome::MatchWon(winner)
                } else {
                    RoundOutcome::RoundWon(round_winner.player_id)
                }
            }
            _ => RoundOutcome::Waiting,
        };

        doc.player_two = Some(two);
        Ok(outcome)
    }
}
