//! Store directory management.
//!
//! ```text
//! <dir>/
//! ├─ LOCK                                  # Advisory lock for the owning process
//! ├─ 00000000000000000001-<uuid>           # One file per entry, named by key
//! └─ .00000000000000000002-<uuid>.tmp      # Transient, write-then-rename
//! ```
//!
//! The LOCK file ensures only one process manages a directory at a time.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the advisory lock file.
pub const LOCK_FILE: &str = "LOCK";

/// A resolved store directory and the lock that claims it.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct StoreDir {
    /// Canonical directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl StoreDir {
    /// Resolves, optionally creates, and locks a store directory.
    ///
    /// # Errors
    ///
    /// - `DirectoryUnavailable` if the path is missing and cannot (or may
    ///   not) be created, or exists but is not a directory
    /// - `StoreLocked` if another process holds the lock
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(CoreError::directory_unavailable(
                    path,
                    "path is not a directory",
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !create_if_missing {
                    return Err(CoreError::directory_unavailable(
                        path,
                        "directory does not exist",
                    ));
                }
                fs::create_dir_all(path)
                    .map_err(|e| CoreError::directory_unavailable(path, e.to_string()))?;
            }
            Err(e) => return Err(CoreError::directory_unavailable(path, e.to_string())),
        }

        let path = fs::canonicalize(path)
            .map_err(|e| CoreError::directory_unavailable(path, e.to_string()))?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        // Non-blocking: a held lock means another owner is live
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked { path });
        }

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    /// Returns the canonical directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_directory() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested").join("spool");

        let dir = StoreDir::open(&target, true).unwrap();
        assert!(target.is_dir());
        assert!(dir.path().join(LOCK_FILE).exists());
        assert!(dir.path().is_absolute());
    }

    #[test]
    fn missing_directory_without_create_fails() {
        let tmp = tempdir().unwrap();
        let result = StoreDir::open(&tmp.path().join("absent"), false);
        assert!(matches!(result, Err(CoreError::DirectoryUnavailable { .. })));
    }

    #[test]
    fn file_path_is_rejected() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, b"x").unwrap();

        let result = StoreDir::open(&file, true);
        assert!(matches!(result, Err(CoreError::DirectoryUnavailable { .. })));
    }

    #[test]
    fn second_lock_is_refused_until_release() {
        let tmp = tempdir().unwrap();

        let first = StoreDir::open(tmp.path(), true).unwrap();
        let second = StoreDir::open(tmp.path(), true);
        assert!(matches!(second, Err(CoreError::StoreLocked { .. })));

        drop(first);
        assert!(StoreDir::open(tmp.path(), true).is_ok());
    }

    #[test]
    fn path_is_canonical() {
        let tmp = tempdir().unwrap();
        let inner = tmp.path().join("spool");
        fs::create_dir(&inner).unwrap();

        let dotted = tmp.path().join(".").join("spool");
        let dir = StoreDir::open(&dotted, false).unwrap();
        assert_eq!(dir.path(), fs::canonicalize(&inner).unwrap());
    }
}
