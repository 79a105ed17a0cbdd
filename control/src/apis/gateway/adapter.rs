//! Pieces shared by the watch adapters

use std::collections::HashSet;
use std::hash::Hash;

/// What a watch adapter did with one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOutcome {
    /// Not ours; the cache was not touched
    Ignored,
    /// Identical to the cached snapshot; nothing enqueued
    Unchanged,
    /// Cache updated and at least one event sent to the processor
    Enqueued,
}

impl AdapterOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterOutcome::Ignored => "ignored",
            AdapterOutcome::Unchanged => "unchanged",
            AdapterOutcome::Enqueued => "enqueued",
        }
    }
}

/// Keys replayed since the watch started re-listing.
///
/// Anything cached before the re-list that is not replayed by the time it
/// completes was deleted while the watch was down.
#[derive(Debug)]
pub(crate) struct RelistTracker<K> {
    seen: Option<HashSet<K>>,
}

impl<K> Default for RelistTracker<K> {
    fn default() -> Self {
        Self { seen: None }
    }
}

impl<K: Eq + Hash + Clone> RelistTracker<K> {
    pub(crate) fn start(&mut self) {
        self.seen = Some(HashSet::new());
    }

    pub(crate) fn observe(&mut self, key: &K) {
        if let Some(seen) = self.seen.as_mut() {
            seen.insert(key.clone());
        }
    }

    /// Close the re-list and return the cached keys it did not replay.
    ///
    /// Without a matching `start` nothing is stale.
    pub(crate) fn finish(&mut self, cached: Vec<K>) -> Vec<K> {
        match self.seen.take() {
            Some(seen) => cached.into_iter().filter(|k| !seen.contains(k)).collect(),
            None => Vec::new(),
        }
    }
}
