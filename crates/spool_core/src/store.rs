//! Store facade and the process-wide registry of open stores.

use crate::config::Config;
use crate::dir::StoreDir;
use crate::engine::Engine;
use crate::entry::{EntryKey, PeekedEntry};
use crate::error::{CoreError, CoreResult};
use crate::executor::Executor;
use crate::reply::Reply;
use crate::stats::{StatsSnapshot, StoreStats};
use crate::tier::DiskTier;
use crate::types::QueueEnd;
use parking_lot::Mutex;
use spool_codec::Document;
use spool_storage::{DirectoryBackend, StorageBackend};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Stores open in this process, by canonical directory.
static OPEN_STORES: Mutex<BTreeMap<PathBuf, Weak<Store>>> =
    parking_lot::const_mutex(BTreeMap::new());

/// A bounded, durable staging buffer.
///
/// Payloads are saved into a small memory tier and spill to one file per
/// entry on disk. Consumers take entries from either end of the queue with
/// [`Store::peek_oldest`] / [`Store::peek_newest`]; a peeked entry is hidden
/// from further peeks until it is deleted or handed back with
/// [`Store::return_oldest`] / [`Store::return_newest`].
///
/// All operations run in submission order on a dedicated thread. Those with
/// a result return a [`Reply`].
///
/// # Example
///
/// ```rust,ignore
/// use spool_core::Store;
/// use spool_codec::Document;
///
/// let store = Store::open("outbox")?;
/// store.save(Document::new().with("event", "login"));
///
/// if let Some(entry) = store.peek_oldest().wait()? {
///     match send(&entry.payload) {
///         Ok(()) => { store.delete(entry.key).wait()?; }
///         Err(_) => store.return_oldest(entry.key),
///     }
/// }
/// ```
///
/// # Thread Safety
///
/// `Store` is `Send + Sync`; share it through the `Arc` returned by
/// [`Store::open`]. Opening the same directory again, under any spelling of
/// its path, returns the same `Arc`.
pub struct Store {
    /// Canonical directory, empty for backend-only stores.
    dir_path: PathBuf,
    executor: Executor,
    stats: Arc<StoreStats>,
}

impl Store {
    /// Opens the store for a directory with default configuration.
    ///
    /// # Errors
    ///
    /// See [`Store::open_with_config`].
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Arc<Self>> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens the store for a directory.
    ///
    /// If this process already has the directory open, the live store is
    /// returned and `config` is ignored. Otherwise the directory is created
    /// (when allowed), locked, and scanned for entries left by a previous
    /// run.
    ///
    /// # Errors
    ///
    /// - `DirectoryUnavailable` if the directory is missing and cannot be
    ///   created, or the path is not a directory
    /// - `StoreLocked` if another process owns the directory
    /// - `Storage` if the directory cannot be scanned
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Arc<Self>> {
        let path = path.as_ref();
        let mut open = OPEN_STORES.lock();

        if let Ok(canonical) = fs::canonicalize(path) {
            if let Some(store) = open.get(&canonical).and_then(Weak::upgrade) {
                debug!(path = %canonical.display(), "reusing open store");
                return Ok(store);
            }
        }

        let dir = StoreDir::open(path, config.create_if_missing)?;
        let canonical = dir.path().to_path_buf();

        let mut backend =
            DirectoryBackend::open(&canonical)?.with_sync_on_write(config.sync_on_write);
        let stale = backend.remove_temp_files()?;
        if stale > 0 {
            warn!(stale, "removed temp files from interrupted writes");
        }

        let store = Arc::new(Self::start(
            canonical.clone(),
            Box::new(backend),
            config,
            Some(dir),
        )?);
        info!(path = %canonical.display(), entries = store.stats.total(), "opened store");

        open.retain(|_, weak| weak.strong_count() > 0);
        open.insert(canonical, Arc::downgrade(&store));
        Ok(store)
    }

    /// Opens a store over an arbitrary backend.
    ///
    /// The store is not registered by path and [`Store::dir_path`] is empty.
    /// Entries already in the backend are recovered.
    pub fn open_with_backend<B>(backend: B, config: Config) -> CoreResult<Arc<Self>>
    where
        B: StorageBackend + 'static,
    {
        Ok(Arc::new(Self::start(
            PathBuf::new(),
            Box::new(backend),
            config,
            None,
        )?))
    }

    fn start(
        dir_path: PathBuf,
        backend: Box<dyn StorageBackend>,
        config: Config,
        dir: Option<StoreDir>,
    ) -> CoreResult<Self> {
        let stats = Arc::new(StoreStats::new());
        let mut engine = Engine::new(DiskTier::new(backend), config, Arc::clone(&stats));
        engine.recover()?;
        let executor = Executor::start(engine, dir)?;

        Ok(Self {
            dir_path,
            executor,
            stats,
        })
    }

    /// Canonical directory backing the store.
    #[must_use]
    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    /// Returns true if the store holds any entry, in-flight ones included.
    ///
    /// Reflects operations the executor has finished; a `save` still queued
    /// is not counted yet.
    #[must_use]
    pub fn has_any_entry(&self) -> bool {
        self.stats.total() > 0
    }

    /// Every key in the store, oldest first.
    pub fn list_keys(&self) -> Reply<Vec<String>> {
        self.executor.call(|engine| engine.list_keys())
    }

    /// The payload saved under `key`, or `None` if the key is unknown.
    pub fn get_payload(&self, key: impl Into<String>) -> Reply<Option<Document>> {
        let key = key.into();
        self.executor.call(move |engine| engine.get_payload(&key))
    }

    /// Removes an entry. Resolves to `false` if the key is unknown or the
    /// entry could not be removed.
    pub fn delete(&self, key: impl Into<String>) -> Reply<bool> {
        let key = key.into();
        self.executor.call(move |engine| engine.delete(&key))
    }

    /// Saves a payload as a new entry.
    ///
    /// Failures are logged, not reported.
    pub fn save(&self, payload: Document) {
        let queued = self.executor.submit(Box::new(move |engine| {
            if let Err(e) = engine.save(payload) {
                warn!(error = %e, "payload dropped");
            }
        }));
        if !queued {
            warn!("store has stopped, payload dropped");
        }
    }

    /// Saves a payload and resolves to the generated key.
    ///
    /// Resolves to [`CoreError::SequenceExhausted`] if the store has handed
    /// out its last sequence number.
    pub fn save_with_key(&self, payload: Document) -> Reply<String> {
        self.executor
            .try_call(move |engine| engine.save(payload).map(EntryKey::into_string))
    }

    /// Moves every memory entry to disk. Resolves to `false` if any write
    /// failed.
    pub fn flush_memory_to_disk(&self) -> Reply<bool> {
        self.executor.call(|engine| engine.flush_memory_to_disk())
    }

    /// Takes the oldest queued entry and marks it in flight.
    pub fn peek_oldest(&self) -> Reply<Option<PeekedEntry>> {
        self.executor.call(|engine| engine.peek(QueueEnd::Oldest))
    }

    /// Takes the newest queued entry and marks it in flight.
    pub fn peek_newest(&self) -> Reply<Option<PeekedEntry>> {
        self.executor.call(|engine| engine.peek(QueueEnd::Newest))
    }

    /// Hands an in-flight entry back, ahead of everything else queued.
    pub fn return_oldest(&self, key: impl Into<String>) {
        self.requeue(key.into(), QueueEnd::Oldest);
    }

    /// Hands an in-flight entry back, behind everything else queued.
    pub fn return_newest(&self, key: impl Into<String>) {
        self.requeue(key.into(), QueueEnd::Newest);
    }

    fn requeue(&self, key: String, end: QueueEnd) {
        let queued = self.executor.submit(Box::new(move |engine| {
            engine.requeue(&key, end);
        }));
        if !queued {
            warn!(?end, "store has stopped, requeue dropped");
        }
    }

    /// Changes the memory tier capacity.
    pub fn set_max_mem_cache_size(&self, size: usize) {
        self.executor.submit(Box::new(move |engine| {
            engine.set_max_mem_cache_size(size);
        }));
    }

    /// Changes the total entry cap (0 = unbounded).
    pub fn set_max_file_size(&self, size: usize) {
        self.executor.submit(Box::new(move |engine| {
            engine.set_max_file_size(size);
        }));
    }

    /// Current configuration, including tunables changed since open.
    pub fn config(&self) -> Reply<Config> {
        self.executor.call(|engine| engine.config())
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shuts the store down and waits for the executor to exit.
    ///
    /// Operations already queued still run. Later ones resolve to
    /// `ExecutorStopped`. A later [`Store::open`] of the same directory
    /// starts a fresh store.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the executor thread panicked.
    pub fn close(&self) -> CoreResult<()> {
        let clean = self.executor.shutdown();

        if !self.dir_path.as_os_str().is_empty() {
            let mut open = OPEN_STORES.lock();
            let ours = open
                .get(&self.dir_path)
                .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), self));
            if ours {
                open.remove(&self.dir_path);
            }
        }

        if clean {
            Ok(())
        } else {
            Err(CoreError::invalid_operation("store executor panicked"))
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.executor.shutdown();
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir_path", &self.dir_path)
            .field("stopped", &self.executor.is_stopped())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_storage::InMemoryBackend;
    use tempfile::tempdir;

    #[test]
    fn open_creates_and_canonicalizes() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("spool");

        let store = Store::open(&path).unwrap();
        assert!(path.is_dir());
        assert_eq!(store.dir_path(), fs::canonicalize(&path).unwrap());
        assert!(!store.has_any_entry());
    }

    #[test]
    fn same_path_yields_same_store() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("spool");

        let a = Store::open(&path).unwrap();
        let b = Store::open(tmp.path().join(".").join("spool")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn close_allows_fresh_open() {
        let tmp = tempdir().unwrap();
        let first = Store::open(tmp.path()).unwrap();
        first.close().unwrap();

        let second = Store::open(tmp.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(matches!(
            first.list_keys().wait(),
            Err(CoreError::ExecutorStopped)
        ));
    }

    #[test]
    fn backend_store_has_no_path() {
        let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
        assert!(store.dir_path().as_os_str().is_empty());

        let key = store
            .save_with_key(Document::new().with("k", "v"))
            .wait()
            .unwrap();
        assert!(store.has_any_entry());
        assert_eq!(store.list_keys().wait().unwrap(), vec![key]);
        store.close().unwrap();
    }
}
