//! # war-engine
//!
//! A match engine for the two-player card game War: shuffling, dealing,
//! and round resolution for persistent players.
//!
//! ## Design Principles
//!
//! 1. **Engine owns the rules**: all game-rule logic lives in
//!    [`engine::MatchEngine`]; transport and API layers are external
//!    collaborators that call one operation per request.
//!
//! 2. **Repositories are the seams**: matches and players live behind
//!    the [`store`] traits. In-memory backends ship with the crate;
//!    anything durable drops in behind the same contracts.
//!
//! 3. **Optimistic concurrency**: every mutating operation is a
//!    read-validate-compute-commit unit against a versioned match
//!    document, retried on conflict from a fresh read. Two racing draws
//!    are both recorded and only one resolves the round.
//!
//! ## Modules
//!
//! - `core`: id newtypes, deterministic forkable RNG, clock
//! - `deck`: rank type, uniform shuffle, alternating deal
//! - `model`: persisted documents and the derived match state machine
//! - `store`: repository contracts plus in-memory backends
//! - `engine`: the state machine, its errors, and the produced views

pub mod core;
pub mod deck;
pub mod engine;
pub mod model;
pub mod store;

// Re-export commonly used types
pub use crate::core::{Clock, GameRng, ManualClock, MatchId, PlayerId, SystemClock};

pub use crate::deck::{Rank, COPIES_PER_RANK, DECK_SIZE, HAND_SIZE};

pub use crate::model::{Hand, Match, MatchState, MatchStatus, Player};

pub use crate::store::{
    MatchStore, MemoryMatchStore, MemoryPlayerStore, PlayerStore, StoreError, Version,
};

pub use crate::engine::{
    EngineError, HandView, MatchEngine, MatchEngineBuilder, MatchSummary, OpenMatchSummary,
    PlayerMatchView, PlayerSummary, DEFAULT_MAX_RETRIES,
};
