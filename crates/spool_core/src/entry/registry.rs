//! Entry registry: every entry the store knows about.

use super::{Entry, EntryKey};
use crate::types::{SequenceNumber, Tier};
use std::collections::{BTreeMap, HashMap};

/// In-process record of every entry, across both tiers.
///
/// Entries are kept in sequence order, with a key lookup on the side.
/// Counts of in-flight and memory-tier entries are maintained
/// incrementally, so the caller must go through [`EntryRegistry::set_tier`]
/// and [`EntryRegistry::set_in_flight`] to change an entry.
#[derive(Debug, Default)]
pub struct EntryRegistry {
    by_sequence: BTreeMap<SequenceNumber, Entry>,
    by_key: HashMap<EntryKey, SequenceNumber>,
    in_flight: usize,
    in_memory: usize,
}

impl EntryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry.
    ///
    /// Returns `false` and leaves the registry unchanged if the key or the
    /// sequence is already registered.
    pub fn insert(&mut self, entry: Entry) -> bool {
        let sequence = entry.sequence();
        if self.by_sequence.contains_key(&sequence) || self.by_key.contains_key(&entry.key) {
            return false;
        }
        if entry.in_flight {
            self.in_flight += 1;
        }
        if entry.tier == Tier::Memory {
            self.in_memory += 1;
        }
        self.by_key.insert(entry.key.clone(), sequence);
        self.by_sequence.insert(sequence, entry);
        true
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        let sequence = self.by_key.get(key)?;
        self.by_sequence.get(sequence)
    }

    /// Removes an entry by key.
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        let sequence = self.by_key.remove(key)?;
        let entry = self.by_sequence.remove(&sequence)?;
        if entry.in_flight {
            self.in_flight -= 1;
        }
        if entry.tier == Tier::Memory {
            self.in_memory -= 1;
        }
        Some(entry)
    }

    /// Moves an entry to another tier. Returns `false` if the key is unknown.
    pub fn set_tier(&mut self, key: &str, tier: Tier) -> bool {
        let Some(entry) = self.entry_mut(key) else {
            return false;
        };
        let previous = std::mem::replace(&mut entry.tier, tier);
        match (previous, tier) {
            (Tier::Memory, Tier::Disk) => self.in_memory -= 1,
            (Tier::Disk, Tier::Memory) => self.in_memory += 1,
            _ => {}
        }
        true
    }

    /// Sets the in-flight flag. Returns the previous value, or `None` if the
    /// key is unknown.
    pub fn set_in_flight(&mut self, key: &str, in_flight: bool) -> Option<bool> {
        let entry = self.entry_mut(key)?;
        let previous = std::mem::replace(&mut entry.in_flight, in_flight);
        match (previous, in_flight) {
            (false, true) => self.in_flight += 1,
            (true, false) => self.in_flight -= 1,
            _ => {}
        }
        Some(previous)
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        let sequence = self.by_key.get(key)?;
        self.by_sequence.get_mut(sequence)
    }

    /// Returns true if the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.by_sequence.len()
    }

    /// Returns true if no entries are registered.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }

    /// Number of in-flight entries.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
    }

    /// Number of entries in the given tier.
    pub fn count_in(&self, tier: Tier) -> usize {
        match tier {
            Tier::Memory => self.in_memory,
            Tier::Disk => self.len() - self.in_memory,
        }
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.by_sequence.values()
    }

    /// Returns up to `limit` keys of non-in-flight entries, oldest first.
    pub fn oldest_idle(&self, limit: usize) -> Vec<EntryKey> {
        self.by_sequence
            .values()
            .filter(|entry| !entry.in_flight)
            .take(limit)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Highest registered sequence.
    pub fn max_sequence(&self) -> Option<SequenceNumber> {
        self.by_sequence.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seq: u64) -> EntryKey {
        EntryKey::generate(SequenceNumber::new(seq))
    }

    #[test]
    fn insert_get_remove() {
        let mut registry = EntryRegistry::new();
        let k = key(1);

        assert!(registry.insert(Entry::new(k.clone(), Tier::Memory)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(k.as_str()).unwrap().tier, Tier::Memory);

        let removed = registry.remove(k.as_str()).unwrap();
        assert_eq!(removed.key, k);
        assert!(registry.is_empty());
        assert_eq!(registry.count_in(Tier::Memory), 0);
    }

    #[test]
    fn duplicate_key_or_sequence_rejected() {
        let mut registry = EntryRegistry::new();
        let k = key(1);

        assert!(registry.insert(Entry::new(k.clone(), Tier::Disk)));
        assert!(!registry.insert(Entry::new(k, Tier::Disk)));
        // Same sequence, different suffix
        assert!(!registry.insert(Entry::new(key(1), Tier::Disk)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn tier_counts_follow_moves() {
        let mut registry = EntryRegistry::new();
        let a = key(1);
        let b = key(2);
        registry.insert(Entry::new(a.clone(), Tier::Memory));
        registry.insert(Entry::new(b, Tier::Memory));
        assert_eq!(registry.count_in(Tier::Memory), 2);

        assert!(registry.set_tier(a.as_str(), Tier::Disk));
        assert_eq!(registry.count_in(Tier::Memory), 1);
        assert_eq!(registry.count_in(Tier::Disk), 1);

        // Idempotent
        assert!(registry.set_tier(a.as_str(), Tier::Disk));
        assert_eq!(registry.count_in(Tier::Disk), 1);
        assert!(!registry.set_tier("unknown", Tier::Disk));
    }

    #[test]
    fn in_flight_tracking() {
        let mut registry = EntryRegistry::new();
        let a = key(1);
        registry.insert(Entry::new(a.clone(), Tier::Memory));

        assert_eq!(registry.set_in_flight(a.as_str(), true), Some(false));
        assert_eq!(registry.in_flight_count(), 1);
        assert_eq!(registry.set_in_flight(a.as_str(), true), Some(true));
        assert_eq!(registry.in_flight_count(), 1);

        registry.remove(a.as_str());
        assert_eq!(registry.in_flight_count(), 0);
        assert_eq!(registry.set_in_flight("unknown", true), None);
    }

    #[test]
    fn oldest_idle_skips_in_flight() {
        let mut registry = EntryRegistry::new();
        let keys: Vec<_> = (1..=4).map(key).collect();
        for k in &keys {
            registry.insert(Entry::new(k.clone(), Tier::Disk));
        }
        registry.set_in_flight(keys[0].as_str(), true);

        assert_eq!(registry.oldest_idle(2), vec![keys[1].clone(), keys[2].clone()]);
        assert_eq!(registry.max_sequence(), Some(SequenceNumber::new(4)));
    }
}
