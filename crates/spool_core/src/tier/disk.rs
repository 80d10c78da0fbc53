//! Disk tier: one encoded document per entry, named by its key.

use crate::error::CoreResult;
use spool_codec::{decode_document, encode_document, Document};
use spool_storage::StorageBackend;

/// Encodes payloads onto a storage backend.
///
/// [`DiskTier::read`] reports the two failure kinds separately so callers
/// can tell a corrupt file (`CoreError::Codec`) from an I/O fault
/// (`CoreError::Storage`).
pub struct DiskTier {
    backend: Box<dyn StorageBackend>,
}

impl DiskTier {
    /// Wraps a backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Reads and decodes a payload. `Ok(None)` if no file exists for the key.
    pub fn read(&self, key: &str) -> CoreResult<Option<Document>> {
        match self.backend.read(key)? {
            Some(bytes) => Ok(Some(decode_document(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes a payload, replacing any previous file.
    pub fn write(&mut self, key: &str, payload: &Document) -> CoreResult<()> {
        let bytes = encode_document(payload)?;
        self.backend.write(key, &bytes)?;
        Ok(())
    }

    /// Removes a payload file. Returns `false` if it did not exist.
    pub fn remove(&mut self, key: &str) -> CoreResult<bool> {
        Ok(self.backend.remove(key)?)
    }

    /// Names of every file the backend holds.
    pub fn keys(&self) -> CoreResult<Vec<String>> {
        Ok(self.backend.keys()?)
    }

    /// Flushes pending writes.
    pub fn sync(&mut self) -> CoreResult<()> {
        Ok(self.backend.sync()?)
    }
}

impl std::fmt::Debug for DiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskTier").finish_non_exhaustive()
    }
}
