//! Delivery order over the entries that can be handed out.
//!
//! The index holds exactly the non-in-flight entries. Each one carries a
//! signed priority: fresh entries take the next value past the newest end,
//! requeued entries can be placed past either end. Priorities are never
//! reused, so an entry returned to the oldest end stays ahead of everything
//! saved afterwards.

use crate::entry::EntryKey;
use crate::types::QueueEnd;
use std::collections::{BTreeMap, HashMap};

/// Ordered set of deliverable entries.
#[derive(Debug, Default)]
pub struct OrderIndex {
    by_priority: BTreeMap<i64, EntryKey>,
    priorities: HashMap<EntryKey, i64>,
    /// Lowest priority handed out so far.
    front: i64,
    /// Highest priority handed out so far.
    back: i64,
}

impl OrderIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key beyond the given end.
    ///
    /// A key that is already indexed is moved.
    pub fn push(&mut self, key: EntryKey, end: QueueEnd) {
        self.remove(key.as_str());
        let priority = match end {
            QueueEnd::Oldest => {
                self.front -= 1;
                self.front
            }
            QueueEnd::Newest => {
                self.back += 1;
                self.back
            }
        };
        self.priorities.insert(key.clone(), priority);
        self.by_priority.insert(priority, key);
    }

    /// Removes a key. Returns `false` if it was not indexed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.priorities.remove(key) {
            Some(priority) => {
                self.by_priority.remove(&priority);
                true
            }
            None => false,
        }
    }

    /// Returns the key at the given end without removing it.
    pub fn peek(&self, end: QueueEnd) -> Option<&EntryKey> {
        match end {
            QueueEnd::Oldest => self.by_priority.values().next(),
            QueueEnd::Newest => self.by_priority.values().next_back(),
        }
    }

    /// Returns true if the key is indexed.
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.priorities.contains_key(key)
    }

    /// Number of indexed keys.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_priority.len()
    }

    /// Returns true if nothing is indexed.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_priority.is_empty()
    }

    /// Iterates keys from the oldest end.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &EntryKey> {
        self.by_priority.values()
    }
}
