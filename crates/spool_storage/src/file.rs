//! Directory-based storage backend: one file per key.

use crate::backend::{validate_key, StorageBackend};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix of in-progress writes. Combined with the reserved leading dot,
/// temp files can never collide with a valid key.
const TEMP_SUFFIX: &str = ".tmp";

/// A storage backend that keeps each blob in its own file.
///
/// The file name is the key. Writes go to `.<key>.tmp` first and are renamed
/// into place, so a crash leaves either the old blob, the new blob, or a
/// stray temp file that [`DirectoryBackend::remove_temp_files`] cleans up.
///
/// # Durability
///
/// With `sync_on_write` enabled every write calls `File::sync_all()` before
/// the rename and the directory is synced afterwards. Otherwise durability
/// is left to the OS until [`StorageBackend::sync`] is called.
///
/// # Example
///
/// ```no_run
/// use spool_storage::{DirectoryBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend = DirectoryBackend::open(Path::new("outbox")).unwrap();
/// backend.write("entry-1", b"payload").unwrap();
/// assert_eq!(backend.read("entry-1").unwrap().as_deref(), Some(&b"payload"[..]));
/// ```
#[derive(Debug)]
pub struct DirectoryBackend {
    path: PathBuf,
    sync_on_write: bool,
}

impl DirectoryBackend {
    /// Opens an existing directory as a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "not a directory: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            sync_on_write: false,
        })
    }

    /// Sets whether each write is fsynced before it becomes visible.
    #[must_use]
    pub fn with_sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Returns the file path for a key.
    #[must_use]
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.path.join(key)
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.path.join(format!(".{key}{TEMP_SUFFIX}"))
    }

    /// Deletes temp files left behind by interrupted writes.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn remove_temp_files(&mut self) -> StorageResult<usize> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.path)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name.starts_with('.') && name.ends_with(TEMP_SUFFIX) {
                match fs::remove_file(dir_entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(file = name, error = %e, "failed to remove stale temp file"),
                }
            }
        }
        if removed > 0 {
            debug!(removed, dir = %self.path.display(), "removed stale temp files");
        }
        Ok(removed)
    }

    /// Syncs the directory so renames and unlinks are durable.
    ///
    /// On Windows, NTFS journaling covers metadata durability, so there is
    /// no explicit directory fsync.
    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl StorageBackend for DirectoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.blob_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let temp_path = self.temp_path(key);

        let result = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(data)?;
            if self.sync_on_write {
                file.sync_all()?;
            }
            drop(file);
            fs::rename(&temp_path, self.blob_path(key))
        })();

        if let Err(e) = result {
            // Best effort; a leftover is cleaned on the next open
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        if self.sync_on_write {
            self.sync_directory()?;
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => {
                if self.sync_on_write {
                    self.sync_directory()?;
                }
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            // Names that are not valid UTF-8 or not valid keys are not ours
            if let Ok(name) = dir_entry.file_name().into_string() {
                if validate_key(&name).is_ok() {
                    keys.push(name);
                }
            }
        }
        Ok(keys)
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.blob_path(key).is_file())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.sync_directory()
    }
}
