//! Entries and their bookkeeping.

mod key;
mod registry;

pub use key::EntryKey;
pub use registry::EntryRegistry;

use crate::types::{SequenceNumber, Tier};
use spool_codec::Document;

/// Registry record of one staged item.
///
/// The payload itself lives in whichever tier `tier` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store-generated key, also the file name on disk.
    pub key: EntryKey,
    /// Where the payload currently lives.
    pub tier: Tier,
    /// Handed to a consumer and not yet deleted or returned.
    pub in_flight: bool,
}

impl Entry {
    /// Creates an idle entry.
    #[must_use]
    pub fn new(key: EntryKey, tier: Tier) -> Self {
        Self {
            key,
            tier,
            in_flight: false,
        }
    }

    /// Creation sequence of the entry.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.key.sequence()
    }
}

/// An entry handed out by a peek.
///
/// The entry stays in the store, in flight, until it is deleted or returned.
#[derive(Debug, Clone, PartialEq)]
pub struct PeekedEntry {
    /// Key to pass to `delete` or `return_oldest`/`return_newest`.
    pub key: String,
    /// The saved document.
    pub payload: Document,
}
