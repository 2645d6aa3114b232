//! Repository contracts for matches and players.
//!
//! The engine is the only writer; these traits are the only durable
//! holders. Match updates are version-conditional: every successful
//! write bumps the document version, and an update carrying a stale
//! expected version fails with [`StoreError::Conflict`] instead of
//! overwriting a concurrent write. The engine retries conflicts from a
//! fresh read.
//!
//! [`memory`] provides lock-based in-memory backends for tests and
//! embedding; any other backend (a document store, a SQL table) can be
//! dropped in behind the same traits.

pub mod memory;

use thiserror::Error;

use crate::core::{MatchId, PlayerId};
use crate::model::{Match, Player};

pub use memory::{MemoryMatchStore, MemoryPlayerStore};

/// Optimistic concurrency token for a stored match document.
///
/// Starts at 0 on insert and increments on every successful update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Version(pub u64);

impl Version {
    /// Create a version from a raw counter value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The version after one successful update.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Errors surfaced by the repositories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored document changed since it was read; retry from a
    /// fresh read.
    #[error("version conflict: document changed since it was read")]
    Conflict,
    /// No document with the given id.
    #[error("document not found")]
    NotFound,
    /// Backend failure (connectivity, corruption, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Durable store of match documents, keyed by [`MatchId`].
pub trait MatchStore: Send + Sync {
    /// Insert a new match, assigning and returning its id. Any id on
    /// the incoming document is ignored.
    fn insert(&self, doc: Match) -> Result<MatchId, StoreError>;

    /// Point lookup, returning the document and its current version.
    fn find(&self, id: MatchId) -> Result<Option<(Match, Version)>, StoreError>;

    /// All matches still open for joining (player two absent).
    fn find_open(&self) -> Result<Vec<Match>, StoreError>;

    /// Replace the document if and only if its stored version equals
    /// `expected`. Fails with [`StoreError::Conflict`] on a stale
    /// version and [`StoreError::NotFound`] if the match vanished.
    fn update(&self, id: MatchId, expected: Version, doc: Match) -> Result<(), StoreError>;
}

/// Durable store of players, keyed by [`PlayerId`].
pub trait PlayerStore: Send + Sync {
    /// Insert a new player, assigning and returning their id. Any id on
    /// the incoming document is ignored.
    fn insert(&self, doc: Player) -> Result<PlayerId, StoreError>;

    /// Point lookup.
    fn find(&self, id: PlayerId) -> Result<Option<Player>, StoreError>;

    /// Atomically add one to the player's all-time win counter.
    fn increment_wins(&self, id: PlayerId) -> Result<(), StoreError>;
}
