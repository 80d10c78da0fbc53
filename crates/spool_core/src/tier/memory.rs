//! Memory tier.

use crate::entry::EntryKey;
use spool_codec::Document;
use std::collections::BTreeMap;

/// Payloads of the most recently saved entries.
///
/// Keys sort in sequence order, so the first entry is always the oldest.
#[derive(Debug, Default)]
pub struct MemoryTier {
    payloads: BTreeMap<EntryKey, Document>,
}

impl MemoryTier {
    /// Creates an empty tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a payload.
    pub fn insert(&mut self, key: EntryKey, payload: Document) {
        self.payloads.insert(key, payload);
    }

    /// Returns the payload for a key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.payloads.get(key)
    }

    /// Removes and returns the payload for a key.
    pub fn remove(&mut self, key: &str) -> Option<Document> {
        self.payloads.remove(key)
    }

    /// Returns the oldest entry.
    pub fn oldest(&self) -> Option<(&EntryKey, &Document)> {
        self.payloads.iter().next()
    }

    /// Keys held in memory, oldest first.
    pub fn keys(&self) -> Vec<EntryKey> {
        self.payloads.keys().cloned().collect()
    }

    /// Number of payloads held.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Returns true if the tier is empty.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}
