//! # Spool Core
//!
//! A bounded, durable staging buffer for items awaiting delivery.
//!
//! This crate provides:
//! - A memory tier for recent entries that spills to one file per entry
//! - Oldest/newest retrieval with in-flight marking, so a delivery attempt
//!   never hands out the same entry twice
//! - Requeue to either end of the queue after a failed delivery
//! - A size cap enforced by evicting the oldest idle entries
//! - A single executor thread that runs every operation in order
//! - One store per canonical directory, shared process-wide
//!
//! ```rust,ignore
//! use spool_core::{Config, Store};
//! use spool_codec::Document;
//!
//! let store = Store::open_with_config("outbox", Config::new().max_file_size(1000))?;
//! store.save(Document::new().with("event", "purchase").with("amount", 42));
//!
//! while let Some(entry) = store.peek_oldest().wait()? {
//!     if deliver(&entry.payload).is_ok() {
//!         store.delete(entry.key).wait()?;
//!     } else {
//!         store.return_oldest(entry.key);
//!         break;
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod engine;
mod entry;
mod error;
mod eviction;
mod executor;
mod order;
mod reply;
mod stats;
mod store;
mod tier;
mod types;

pub use config::{Config, DEFAULT_EVICTION_PERCENT, DEFAULT_MAX_MEM_CACHE_SIZE};
pub use dir::LOCK_FILE;
pub use entry::{EntryKey, PeekedEntry};
pub use error::{CoreError, CoreResult};
pub use eviction::EvictionPolicy;
pub use reply::Reply;
pub use stats::{StatsSnapshot, StoreStats};
pub use store::Store;
pub use types::{QueueEnd, SequenceNumber, Tier};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
