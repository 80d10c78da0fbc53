//! In-memory storage backend for testing.

use crate::backend::{validate_key, StorageBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory storage backend.
///
/// This backend stores all blobs in memory and is suitable for:
/// - Unit tests
/// - Ephemeral spools that don't need persistence
///
/// Clones share the same blobs, so a test can keep a handle after moving
/// the backend into a store. [`InMemoryBackend::set_fail_writes`] makes
/// every subsequent write and removal fail, for exercising I/O error paths.
///
/// # Example
///
/// ```rust
/// use spool_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write("k", b"test data").unwrap();
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Inserts a blob directly, bypassing key validation and fault injection.
    ///
    /// Useful for seeding recovery scenarios.
    pub fn insert_raw(&self, key: impl Into<String>, data: Vec<u8>) {
        self.blobs.write().insert(key.into(), data);
    }

    /// Makes writes and removals fail with an I/O error while `fail` is true.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.blobs.read().get(key).cloned())
    }

    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.blobs.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        self.check_writable()?;
        Ok(self.blobs.write().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.blobs.read().keys().cloned().collect())
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.blobs.read().contains_key(key))
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Nothing is pending in memory
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty());
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn memory_write_read_remove() {
        let mut backend = InMemoryBackend::new();
        backend.write("a", b"one").unwrap();

        assert_eq!(backend.read("a").unwrap(), Some(b"one".to_vec()));
        assert!(backend.contains("a").unwrap());
        assert!(backend.remove("a").unwrap());
        assert!(!backend.remove("a").unwrap());
        assert_eq!(backend.read("a").unwrap(), None);
    }

    #[test]
    fn memory_clones_share_state() {
        let mut backend = InMemoryBackend::new();
        let observer = backend.clone();

        backend.write("shared", b"x").unwrap();
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn memory_injected_failures() {
        let mut backend = InMemoryBackend::new();
        backend.write("k", b"x").unwrap();

        backend.set_fail_writes(true);
        assert!(matches!(backend.write("j", b"y"), Err(StorageError::Io(_))));
        assert!(matches!(backend.remove("k"), Err(StorageError::Io(_))));
        // Reads still work
        assert_eq!(backend.read("k").unwrap(), Some(b"x".to_vec()));

        backend.set_fail_writes(false);
        backend.write("j", b"y").unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn memory_rejects_invalid_keys() {
        let mut backend = InMemoryBackend::new();
        assert!(backend.write("", b"x").is_err());
        assert!(backend.write(".tmp", b"x").is_err());
    }

    #[test]
    fn memory_insert_raw_bypasses_checks() {
        let backend = InMemoryBackend::new();
        backend.set_fail_writes(true);
        backend.insert_raw("seeded", vec![1, 2, 3]);
        assert_eq!(backend.read("seeded").unwrap(), Some(vec![1, 2, 3]));
    }
}
