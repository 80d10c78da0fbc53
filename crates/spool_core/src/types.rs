//! Core type definitions for Spool.

use std::fmt;

/// Creation sequence of an entry.
///
/// Sequence numbers are strictly increasing within a store and define the
/// oldest/newest order of entries. Higher sequence numbers are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// The first sequence number handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number, or `None` at `u64::MAX`.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// Where an entry's payload currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Held in the in-memory staging area.
    Memory,
    /// Stored as a file in the store directory.
    Disk,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Memory => f.write_str("memory"),
            Tier::Disk => f.write_str("disk"),
        }
    }
}

/// One end of the delivery queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueEnd {
    /// The end holding the entry that should be delivered first.
    Oldest,
    /// The end holding the most recently queued entry.
    Newest,
}
