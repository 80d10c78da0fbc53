//! # Spool Storage
//!
//! Blob storage backends for the Spool disk tier.
//!
//! Backends are **key-addressed byte stores**: one opaque blob per key.
//! They do not interpret what they store.
//!
//! ## Design Principles
//!
//! - Backends are simple blob stores (read, write, remove, list)
//! - Writes are atomic per key
//! - No knowledge of entries, sequences or payload encoding
//! - Must be `Send + Sync` so a store can move them to its worker thread
//!
//! ## Available Backends
//!
//! - [`DirectoryBackend`] - One file per key, for persistent storage
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use spool_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write("entry-1", b"hello world").unwrap();
//! let data = backend.read("entry-1").unwrap();
//! assert_eq!(data.as_deref(), Some(&b"hello world"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use file::DirectoryBackend;
pub use memory::InMemoryBackend;
