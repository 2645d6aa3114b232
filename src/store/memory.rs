//! In-memory store backends.
//!
//! Each store holds its documents in an `FxHashMap` behind a
//! `parking_lot::RwLock`. Ids are allocated from a monotonic counter;
//! match versions bump on every successful update so stale writers get
//! a conflict instead of clobbering a concurrent write.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{MatchId, PlayerId};
use crate::model::{Match, Player};

use super::{MatchStore, PlayerStore, StoreError, Version};

/// In-memory, versioned match store.
#[derive(Debug, Default)]
pub struct MemoryMatchStore {
    inner: RwLock<MatchTable>,
}

#[derive(Debug, Default)]
struct MatchTable {
    docs: FxHashMap<MatchId, (Match, Version)>,
    next_id: u64,
}

impl MemoryMatchStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for MemoryMatchStore {
    fn insert(&self, mut doc: Match) -> Result<MatchId, StoreError> {
        let mut table = self.inner.write();
        table.next_id += 1;
        let id = MatchId::new(table.next_id);
        doc.id = id;
        table.docs.insert(id, (doc, Version::default()));
        Ok(id)
    }

    fn find(&self, id: MatchId) -> Result<Option<(Match, Version)>, StoreError> {
        Ok(self.inner.read().docs.get(&id).cloned())
    }

    fn find_open(&self) -> Result<Vec<Match>, StoreError> {
        let table = self.inner.read();
        let mut open: Vec<Match> = table
            .docs
            .values()
            .filter(|(doc, _)| doc.player_two.is_none())
            .map(|(doc, _)| doc.clone())
            .collect();
        // FxHashMap iteration order is arbitrary; keep listings stable
        open.sort_by_key(|doc| doc.id);
        Ok(open)
    }

    fn update(&self, id: MatchId, expected: Version, mut doc: Match) -> Result<(), StoreError> {
        let mut table = self.inner.write();
        let Some((stored, version)) = table.docs.get_mut(&id) else {
            return Err(StoreError::NotFound);
        };
        if *version != expected {
            return Err(StoreError::Conflict);
        }
        doc.id = id;
        *stored = doc;
        *version = version.next();
        Ok(())
    }
}

/// In-memory player store.
#[derive(Debug, Default)]
pub struct MemoryPlayerStore {
    inner: RwLock<PlayerTable>,
}

#[derive(Debug, Default)]
struct PlayerTable {
    docs: FxHashMap<PlayerId, Player>,
    next_id: u64,
}

impl MemoryPlayerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn insert(&self, mut doc: Player) -> Result<PlayerId, StoreError> {
        let mut table = self.inner.write();
        table.next_id += 1;
        let id = PlayerId::new(table.next_id);
        doc.id = id;
        table.docs.insert(id, doc);
        Ok(id)
    }

    fn find(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        Ok(self.inner.read().docs.get(&id).cloned())
    }

    fn increment_wins(&self, id: PlayerId) -> Result<(), StoreError> {
        let mut table = self.inner.write();
        let Some(player) = table.docs.get_mut(&id) else {
            return Err(StoreError::NotFound);
        };
        player.wins += 1;
        Ok(())
    }
}
