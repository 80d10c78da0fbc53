//! The store engine: registry, order index and both tiers.
//!
//! The engine is single-threaded. It lives on the executor thread and every
//! store operation arrives as a call on it, one at a time.

use crate::config::Config;
use crate::entry::{Entry, EntryKey, EntryRegistry, PeekedEntry};
use crate::error::{CoreError, CoreResult};
use crate::eviction::EvictionPolicy;
use crate::order::OrderIndex;
use crate::stats::StoreStats;
use crate::tier::{DiskTier, MemoryTier};
use crate::types::{QueueEnd, SequenceNumber, Tier};
use spool_codec::Document;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State and logic behind a store.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    registry: EntryRegistry,
    index: OrderIndex,
    memory: MemoryTier,
    disk: DiskTier,
    eviction: EvictionPolicy,
    /// `None` once the highest sequence has been handed out.
    next_sequence: Option<SequenceNumber>,
    stats: Arc<StoreStats>,
}

impl Engine {
    /// Creates an empty engine over a disk tier.
    ///
    /// Call [`Engine::recover`] to pick up entries already on disk.
    pub fn new(disk: DiskTier, config: Config, stats: Arc<StoreStats>) -> Self {
        let eviction = EvictionPolicy::new(config.max_file_size, config.eviction_percent);
        Self {
            config,
            registry: EntryRegistry::new(),
            index: OrderIndex::new(),
            memory: MemoryTier::new(),
            disk,
            eviction,
            next_sequence: Some(SequenceNumber::FIRST),
            stats,
        }
    }

    /// Registers every entry file found on disk, oldest first.
    ///
    /// Payloads are not read. Files whose names are not entry keys are left
    /// alone. Returns the number of entries recovered.
    pub fn recover(&mut self) -> CoreResult<usize> {
        let mut keys = Vec::new();
        let mut ignored = 0usize;
        for name in self.disk.keys()? {
            match EntryKey::parse(&name) {
                Some(key) => keys.push(key),
                None => ignored += 1,
            }
        }
        keys.sort();

        for key in keys {
            if !self.registry.insert(Entry::new(key.clone(), Tier::Disk)) {
                warn!(key = %key, "sequence already recovered, ignoring file");
                continue;
            }
            self.index.push(key, QueueEnd::Newest);
        }

        if let Some(max) = self.registry.max_sequence() {
            self.next_sequence = max.checked_next();
            if self.next_sequence.is_none() {
                warn!(last = %max, "sequence numbers exhausted, new entries will be rejected");
            }
        }

        let recovered = self.registry.len();
        if recovered > 0 {
            info!(
                recovered,
                ignored,
                next = ?self.next_sequence.map(SequenceNumber::as_u64),
                "recovered entries from disk"
            );
        }

        self.enforce_cap();
        self.publish();
        Ok(recovered)
    }

    /// Stages a new entry in memory and returns its key.
    ///
    /// Spills the oldest memory entries if the memory tier is over capacity,
    /// then applies the size cap. Fails only when no sequence number is left.
    pub fn save(&mut self, payload: Document) -> CoreResult<EntryKey> {
        let Some(sequence) = self.next_sequence else {
            return Err(CoreError::SequenceExhausted {
                last: self.registry.max_sequence().map_or(u64::MAX, SequenceNumber::as_u64),
            });
        };
        self.next_sequence = sequence.checked_next();

        let key = EntryKey::generate(sequence);
        self.registry.insert(Entry::new(key.clone(), Tier::Memory));
        self.memory.insert(key.clone(), payload);
        self.index.push(key.clone(), QueueEnd::Newest);
        self.stats.record_save();
        debug!(key = %key, "saved entry");

        self.spill_excess();
        self.enforce_cap();
        self.publish();
        Ok(key)
    }

    /// Every registered key, oldest first, in-flight entries included.
    pub fn list_keys(&self) -> Vec<String> {
        self.registry
            .iter()
            .map(|entry| entry.key.to_string())
            .collect()
    }

    /// Returns the payload of an entry, from memory or disk.
    ///
    /// Unknown keys and unreadable files both yield `None`.
    pub fn get_payload(&self, key: &str) -> Option<Document> {
        if let Some(payload) = self.memory.get(key) {
            return Some(payload.clone());
        }
        if !self.registry.contains(key) {
            return None;
        }
        match self.disk.read(key) {
            Ok(Some(payload)) => Some(payload),
            Ok(None) => {
                warn!(key, "entry file is missing");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "failed to read entry");
                None
            }
        }
    }

    /// Removes an entry from the store.
    ///
    /// Returns `false` for an unknown key, or if the entry file could not be
    /// removed (the entry then stays).
    pub fn delete(&mut self, key: &str) -> bool {
        if !self.registry.contains(key) {
            debug!(key, "delete of unknown key");
            return false;
        }
        match self.drop_entry(key) {
            Ok(()) => {
                self.stats.record_delete();
                self.publish();
                debug!(key, "deleted entry");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "failed to delete entry");
                false
            }
        }
    }

    /// Moves every memory entry to disk, in-flight ones included.
    ///
    /// Returns `false` if any write failed; those entries stay in memory.
    pub fn flush_memory_to_disk(&mut self) -> bool {
        let mut ok = true;
        let mut moved = 0usize;
        for key in self.memory.keys() {
            if self.migrate(&key) {
                moved += 1;
            } else {
                ok = false;
            }
        }

        if moved > 0 {
            if let Err(e) = self.disk.sync() {
                warn!(error = %e, "failed to sync store directory");
                ok = false;
            }
        }

        self.publish();
        debug!(moved, remaining = self.memory.len(), "flushed memory tier");
        ok
    }

    /// Hands out the entry at one end of the queue and marks it in flight.
    ///
    /// Entries whose file is gone or no longer decodes are discarded and the
    /// next candidate is tried. An I/O error leaves the candidate queued and
    /// yields `None`.
    pub fn peek(&mut self, end: QueueEnd) -> Option<PeekedEntry> {
        loop {
            let key = self.index.peek(end)?.clone();
            let tier = self.registry.get(key.as_str()).map(|entry| entry.tier);

            let payload = match tier {
                Some(Tier::Memory) => self.memory.get(key.as_str()).cloned(),
                Some(Tier::Disk) => match self.disk.read(key.as_str()) {
                    Ok(payload) => payload,
                    Err(CoreError::Codec(e)) => {
                        warn!(key = %key, error = %e, "entry file does not decode");
                        None
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "failed to read entry, leaving it queued");
                        return None;
                    }
                },
                None => None,
            };

            match payload {
                Some(payload) => {
                    self.index.remove(key.as_str());
                    self.registry.set_in_flight(key.as_str(), true);
                    self.publish();
                    debug!(key = %key, ?end, "entry in flight");
                    return Some(PeekedEntry {
                        key: key.into_string(),
                        payload,
                    });
                }
                None => {
                    warn!(key = %key, "discarding unreadable entry");
                    self.discard(key.as_str());
                }
            }
        }
    }

    /// Returns an in-flight entry to one end of the queue.
    ///
    /// Unknown keys and entries that are not in flight are ignored.
    pub fn requeue(&mut self, key: &str, end: QueueEnd) -> bool {
        let Some(entry) = self.registry.get(key) else {
            debug!(key, "requeue of unknown key ignored");
            return false;
        };
        if !entry.in_flight {
            debug!(key, "requeue of idle entry ignored");
            return false;
        }

        let entry_key = entry.key.clone();
        self.registry.set_in_flight(key, false);
        self.index.push(entry_key, end);
        self.stats.record_requeue();
        self.publish();
        debug!(key, ?end, "entry requeued");
        true
    }

    /// Changes the memory tier capacity, spilling if it shrank.
    pub fn set_max_mem_cache_size(&mut self, size: usize) {
        self.config.max_mem_cache_size = size;
        self.spill_excess();
        self.publish();
    }

    /// Changes the total entry cap, evicting if it is now exceeded.
    pub fn set_max_file_size(&mut self, size: usize) {
        self.config.max_file_size = size;
        self.eviction = EvictionPolicy::new(size, self.config.eviction_percent);
        self.enforce_cap();
        self.publish();
    }

    /// Current configuration, tunables included.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Final work before the executor exits.
    pub fn shutdown(&mut self) {
        if self.config.flush_on_shutdown && !self.memory.is_empty() {
            if !self.flush_memory_to_disk() {
                warn!(
                    remaining = self.memory.len(),
                    "entries left in memory at shutdown are lost"
                );
            }
        }
        info!(entries = self.registry.len(), "store shut down");
    }

    /// Spills the oldest memory entries until the tier is within capacity.
    ///
    /// Stops at the first failed write.
    fn spill_excess(&mut self) {
        while self.memory.len() > self.config.max_mem_cache_size {
            let Some(key) = self.memory.oldest().map(|(key, _)| key.clone()) else {
                break;
            };
            if !self.migrate(&key) {
                break;
            }
        }
    }

    /// Writes one memory entry to disk and moves it to the disk tier.
    fn migrate(&mut self, key: &EntryKey) -> bool {
        let Some(payload) = self.memory.get(key.as_str()) else {
            return true;
        };
        if let Err(e) = self.disk.write(key.as_str(), payload) {
            self.stats.record_write_failure();
            warn!(key = %key, error = %e, "failed to write entry to disk");
            return false;
        }
        self.memory.remove(key.as_str());
        self.registry.set_tier(key.as_str(), Tier::Disk);
        self.stats.record_spill();
        true
    }

    /// Evicts the oldest idle entries while the store is over its cap.
    fn enforce_cap(&mut self) {
        let target = self.eviction.target(self.registry.len());
        if target == 0 {
            return;
        }

        let mut evicted = 0usize;
        for key in self.registry.oldest_idle(target) {
            match self.drop_entry(key.as_str()) {
                Ok(()) => evicted += 1,
                Err(e) => warn!(key = %key, error = %e, "failed to evict entry"),
            }
        }

        if evicted < target {
            debug!(
                target,
                evicted,
                in_flight = self.registry.in_flight_count(),
                "store remains over its cap"
            );
        }
        self.stats.record_evictions(evicted as u64);
        info!(evicted, total = self.registry.len(), "evicted oldest entries");
    }

    /// Removes an entry from its tier, the index and the registry.
    ///
    /// A disk error leaves everything in place.
    fn drop_entry(&mut self, key: &str) -> CoreResult<()> {
        let Some(entry) = self.registry.get(key) else {
            return Ok(());
        };
        match entry.tier {
            Tier::Memory => {
                self.memory.remove(key);
            }
            Tier::Disk => {
                if !self.disk.remove(key)? {
                    warn!(key, "entry file was already gone");
                }
            }
        }
        self.index.remove(key);
        self.registry.remove(key);
        Ok(())
    }

    /// Forgets an unreadable entry, even if its file cannot be removed.
    fn discard(&mut self, key: &str) {
        self.index.remove(key);
        match self.registry.remove(key).map(|entry| entry.tier) {
            Some(Tier::Memory) => {
                self.memory.remove(key);
            }
            Some(Tier::Disk) => {
                if let Err(e) = self.disk.remove(key) {
                    warn!(key, error = %e, "failed to remove discarded entry file");
                }
            }
            None => {}
        }
        self.stats.record_discard();
        self.publish();
    }

    fn publish(&self) {
        self.stats.set_gauges(
            self.registry.len(),
            self.registry.count_in(Tier::Memory),
            self.registry.in_flight_count(),
        );
    }
}
