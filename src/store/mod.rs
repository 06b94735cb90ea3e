//! Durable, bounded record of already-delivered alert identities.
//!
//! [`SeenIds`] is an insertion-ordered set. Stores cap it at a fixed
//! capacity (default [`MAX_SEEN`]) and evict the oldest inserted entries
//! first. Reads never touch the network.

pub mod file;

pub use file::FileSeenStore;

use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;

/// Default number of identities retained by a store.
pub const MAX_SEEN: usize = 200;

/// Insertion-ordered set of identity strings.
///
/// Re-inserting an existing member keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SeenIds {
    order: Vec<String>,
    members: HashSet<String>,
}

impl SeenIds {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Append `id` if absent. Returns `true` when newly inserted.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Members from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Keep only the `max` most recently inserted members, preserving order.
    pub fn trim_to(&mut self, max: usize) {
        if self.order.len() <= max {
            return;
        }
        let drop_count = self.order.len().saturating_sub(max);
        for evicted in self.order.drain(0..drop_count) {
            self.members.remove(&evicted);
        }
    }

    /// This set followed by any members of `ids` not already present.
    #[must_use]
    pub fn union<I, S>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged = self.clone();
        merged.extend(ids);
        merged
    }
}

impl<S: Into<String>> Extend<S> for SeenIds {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SeenIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::new();
        ids.extend(iter);
        ids
    }
}

impl From<Vec<String>> for SeenIds {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<SeenIds> for Vec<String> {
    fn from(ids: SeenIds) -> Self {
        ids.order
    }
}

/// Persisted set of delivered identities.
///
/// `update` replaces the whole set and `commit` merges into it; both trim
/// to [`SeenStore::capacity`] and must be atomic with respect to readers.
/// `commit` re-reads the current set under the store's write lock, so two
/// concurrent committers merge instead of overwriting each other.
pub trait SeenStore: Send + Sync {
    /// Current identity set.
    fn get(&self) -> Result<SeenIds>;

    /// Replace the stored set with `ids`, keeping the newest `capacity()` members.
    fn update(&self, ids: SeenIds) -> Result<()>;

    /// Append `new_ids` to the current set and persist. Returns the stored set.
    fn commit(&self, new_ids: &[String]) -> Result<SeenIds>;

    /// Maximum number of identities retained.
    fn capacity(&self) -> usize {
        MAX_SEEN
    }
}

/// Process-local store, used by tests and by hosts without durable storage.
#[derive(Debug)]
pub struct MemorySeenStore {
    ids: RwLock<SeenIds>,
    capacity: usize,
}

impl MemorySeenStore {
    /// Create an empty store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_SEEN)
    }

    /// Create an empty store retaining at most `capacity` identities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: RwLock::new(SeenIds::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for MemorySeenStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> AlertError {
    AlertError::Persistence(format!("seen store lock poisoned: {e}"))
}

impl SeenStore for MemorySeenStore {
    fn get(&self) -> Result<SeenIds> {
        Ok(self.ids.read().map_err(poisoned)?.clone())
    }

    fn update(&self, mut ids: SeenIds) -> Result<()> {
        ids.trim_to(self.capacity);
        *self.ids.write().map_err(poisoned)? = ids;
        Ok(())
    }

    fn commit(&self, new_ids: &[String]) -> Result<SeenIds> {
        let mut guard = self.ids.write().map_err(poisoned)?;
        guard.extend(new_ids.iter().cloned());
        guard.trim_to(self.capacity);
        Ok(guard.clone())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
