//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A key-addressed blob store backing the disk tier.
///
/// Backends store **opaque byte blobs**, one per key. They do not know
/// about entries, sequences or payload encoding; the core owns all of that.
///
/// # Invariants
///
/// - `write` replaces any previous blob under the key atomically: a reader
///   sees either the old blob or the new one, never a partial write
/// - `read` returns exactly the bytes last written, or `None`
/// - `keys` lists every stored key, in no particular order
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::DirectoryBackend`] - One file per key in a directory
/// - [`super::InMemoryBackend`] - For testing
pub trait StorageBackend: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if no blob exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `data` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the blob stored under `key`.
    ///
    /// Returns `true` if a blob was removed, `false` if none existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Lists all stored keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Returns true if a blob exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.read(key)?.is_some())
    }

    /// Makes all completed writes and removals durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}

/// Checks that a key can be used as a blob name.
///
/// Keys must be non-empty, must not start with `.` (reserved for temporary
/// files), and must not contain path separators or NUL.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first violated rule.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "empty"));
    }
    if key.starts_with('.') {
        return Err(StorageError::invalid_key(key, "leading dot is reserved"));
    }
    if key.contains(['/', '\\', '\0']) {
        return Err(StorageError::invalid_key(key, "contains a path separator"));
    }
    Ok(())
}
