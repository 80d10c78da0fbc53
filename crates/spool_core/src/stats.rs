//! Store statistics.
//!
//! Gauges describe the store right now; counters only ever grow.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spool_core::Store;
//!
//! let store = Store::open("outbox")?;
//! store.save(payload);
//!
//! let stats = store.stats();
//! println!("Entries: {} ({} on disk)", stats.total, stats.disk);
//! println!("Evicted: {}", stats.evicted);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live statistics, shared between the executor and store handles.
///
/// The executor writes, any thread may read.
#[derive(Debug, Default)]
pub struct StoreStats {
    // Gauges
    total: AtomicU64,
    memory: AtomicU64,
    disk: AtomicU64,
    in_flight: AtomicU64,

    // Counters
    saved: AtomicU64,
    deleted: AtomicU64,
    evicted: AtomicU64,
    spilled: AtomicU64,
    requeued: AtomicU64,
    discarded: AtomicU64,
    write_failures: AtomicU64,
}

impl StoreStats {
    /// Creates a zeroed stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the current entry counts.
    pub(crate) fn set_gauges(&self, total: usize, memory: usize, in_flight: usize) {
        self.total.store(total as u64, Ordering::Release);
        self.memory.store(memory as u64, Ordering::Relaxed);
        self.disk
            .store(total.saturating_sub(memory) as u64, Ordering::Relaxed);
        self.in_flight.store(in_flight as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_save(&self) {
        self.saved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_spill(&self) {
        self.spilled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeue(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of entries across both tiers.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total(),
            memory: self.memory.load(Ordering::Relaxed),
            disk: self.disk.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            spilled: self.spilled.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Entries across both tiers, in-flight included.
    pub total: u64,
    /// Entries whose payload is in memory.
    pub memory: u64,
    /// Entries whose payload is on disk.
    pub disk: u64,
    /// Entries handed to a consumer and not yet resolved.
    pub in_flight: u64,
    /// Entries saved since open.
    pub saved: u64,
    /// Entries removed by `delete`.
    pub deleted: u64,
    /// Entries removed to respect the size cap.
    pub evicted: u64,
    /// Entries migrated from memory to disk.
    pub spilled: u64,
    /// In-flight entries returned to the queue.
    pub requeued: u64,
    /// Entries dropped because their file was missing or unreadable.
    pub discarded: u64,
    /// Failed disk writes.
    pub write_failures: u64,
}
