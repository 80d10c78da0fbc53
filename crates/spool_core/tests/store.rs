//! End-to-end tests for the store facade over real directories.

use spool_codec::{Document, Value};
use spool_core::{Config, CoreError, EntryKey, Store, LOCK_FILE};
use spool_storage::InMemoryBackend;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn doc(name: &str) -> Document {
    Document::new().with("name", name)
}

fn name_of(payload: &Document) -> String {
    payload
        .get("name")
        .and_then(Value::as_text)
        .unwrap()
        .to_string()
}

/// Entry files in a store directory, ignoring the lock file.
fn entry_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != LOCK_FILE)
        .collect();
    names.sort();
    names
}

#[test]
fn payload_round_trips() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let payload = Document::new()
        .with("id", 7)
        .with("ratio", 0.25)
        .with("ok", true)
        .with("blob", vec![1u8, 2, 3])
        .with("tags", vec![Value::from("a"), Value::from("b")])
        .with("nested", Document::new().with("deep", Value::Null));

    let key = store.save_with_key(payload.clone()).wait().unwrap();
    assert_eq!(store.get_payload(&key).wait().unwrap(), Some(payload.clone()));

    // Same answer once the payload lives on disk
    assert!(store.flush_memory_to_disk().wait().unwrap());
    assert_eq!(store.get_payload(&key).wait().unwrap(), Some(payload));
}

#[test]
fn unknown_key_is_not_an_error() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    assert_eq!(store.get_payload("missing").wait().unwrap(), None);
    assert!(!store.delete("missing").wait().unwrap());
}

#[test]
fn memory_tier_spills_oldest_to_disk() {
    let tmp = tempdir().unwrap();
    let store = Store::open_with_config(tmp.path(), Config::new().max_mem_cache_size(2)).unwrap();

    let a = store.save_with_key(doc("a")).wait().unwrap();
    let b = store.save_with_key(doc("b")).wait().unwrap();
    let c = store.save_with_key(doc("c")).wait().unwrap();

    // Memory holds {b, c}, disk holds {a}
    assert_eq!(entry_files(tmp.path()), vec![a.clone()]);
    let stats = store.stats();
    assert_eq!((stats.memory, stats.disk), (2, 1));

    let peeked = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(peeked.key, a);
    assert_eq!(name_of(&peeked.payload), "a");

    assert!(store.delete(&a).wait().unwrap());
    assert_eq!(store.list_keys().wait().unwrap(), vec![b, c]);
    assert!(entry_files(tmp.path()).is_empty());
}

#[test]
fn twenty_first_save_evicts_exactly_one() {
    let store = Store::open_with_backend(
        InMemoryBackend::new(),
        Config::new().max_file_size(20),
    )
    .unwrap();

    let keys: Vec<String> = (0..21)
        .map(|i| store.save_with_key(doc(&i.to_string())).wait().unwrap())
        .collect();

    let remaining = store.list_keys().wait().unwrap();
    assert_eq!(remaining.len(), 20);
    assert_eq!(remaining, keys[1..].to_vec());
    assert_eq!(store.stats().evicted, 1);
}

#[test]
fn eviction_keeps_count_within_cap() {
    let cap = 100;
    let store = Store::open_with_backend(
        InMemoryBackend::new(),
        Config::new().max_file_size(cap),
    )
    .unwrap();

    for i in 0..350 {
        store.save(doc(&i.to_string()));
    }
    let remaining = store.list_keys().wait().unwrap();
    assert!(remaining.len() <= cap);
    // Each overflow drops floor(101 * 5%) = 5 entries
    assert!(remaining.len() >= cap - 5);
}

#[test]
fn concurrent_peeks_never_share_an_entry() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    for i in 0..200 {
        store.save(doc(&i.to_string()));
    }

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(entry) = store.peek_oldest().wait().unwrap() {
                    taken.push(entry.key);
                }
                taken
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(seen.insert(key), "entry handed out twice");
        }
    }
    assert_eq!(seen.len(), 200);
    assert_eq!(store.stats().in_flight, 200);
}

#[test]
fn peeks_follow_creation_order() {
    let store = Store::open_with_backend(
        InMemoryBackend::new(),
        Config::new().max_mem_cache_size(3),
    )
    .unwrap();
    for name in ["a", "b", "c", "d", "e", "f"] {
        store.save(doc(name));
    }

    let oldest: Vec<_> = (0..3)
        .map(|_| name_of(&store.peek_oldest().wait().unwrap().unwrap().payload))
        .collect();
    let newest: Vec<_> = (0..3)
        .map(|_| name_of(&store.peek_newest().wait().unwrap().unwrap().payload))
        .collect();

    assert_eq!(oldest, vec!["a", "b", "c"]);
    assert_eq!(newest, vec!["f", "e", "d"]);
    assert!(store.peek_oldest().wait().unwrap().is_none());
}

#[test]
fn return_oldest_hands_back_same_entry() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    store.save(doc("a"));
    store.save(doc("b"));

    let first = store.peek_oldest().wait().unwrap().unwrap();
    store.return_oldest(&first.key);
    let again = store.peek_oldest().wait().unwrap().unwrap();

    assert_eq!(again.key, first.key);
    assert_eq!(store.stats().requeued, 1);
}

#[test]
fn return_newest_moves_entry_to_back() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    for name in ["a", "b", "c"] {
        store.save(doc(name));
    }

    let a = store.peek_oldest().wait().unwrap().unwrap();
    store.return_newest(&a.key);

    let next = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(name_of(&next.payload), "b");
    let last = store.peek_newest().wait().unwrap().unwrap();
    assert_eq!(last.key, a.key);
}

#[test]
fn returning_an_idle_entry_does_nothing() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    let a = store.save_with_key(doc("a")).wait().unwrap();
    store.save(doc("b"));

    store.return_newest(&a);
    let next = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(next.key, a);
    assert_eq!(store.stats().requeued, 0);
}

#[test]
fn flush_keeps_in_flight_entries_in_flight() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    store.save(doc("a"));
    store.save(doc("b"));

    let a = store.peek_oldest().wait().unwrap().unwrap();
    assert!(store.flush_memory_to_disk().wait().unwrap());
    assert_eq!(entry_files(tmp.path()).len(), 2);

    let b = store.peek_oldest().wait().unwrap().unwrap();
    assert_ne!(a.key, b.key);
    assert!(store.peek_oldest().wait().unwrap().is_none());
    assert_eq!(store.stats().in_flight, 2);
}

#[test]
fn reopen_recovers_entries_in_order() {
    let tmp = tempdir().unwrap();
    let keys: Vec<String> = {
        let store = Store::open(tmp.path()).unwrap();
        let keys = ["a", "b", "c"]
            .iter()
            .map(|name| store.save_with_key(doc(name)).wait().unwrap())
            .collect();
        store.close().unwrap();
        keys
    };

    let store = Store::open(tmp.path()).unwrap();
    assert!(store.has_any_entry());
    assert_eq!(store.list_keys().wait().unwrap(), keys);

    let later = store.save_with_key(doc("d")).wait().unwrap();
    let later_seq = EntryKey::parse(&later).unwrap().sequence();
    let last_seq = EntryKey::parse(&keys[2]).unwrap().sequence();
    assert!(later_seq > last_seq);

    let first = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(first.key, keys[0]);
    assert_eq!(name_of(&first.payload), "a");
}

#[test]
fn dropping_last_handle_flushes_memory() {
    let tmp = tempdir().unwrap();
    {
        let store = Store::open(tmp.path()).unwrap();
        store.save(doc("kept"));
    }
    assert_eq!(entry_files(tmp.path()).len(), 1);

    let store = Store::open(tmp.path()).unwrap();
    let peeked = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(name_of(&peeked.payload), "kept");
}

#[test]
fn memory_is_lost_without_flush_on_shutdown() {
    let tmp = tempdir().unwrap();
    {
        let store =
            Store::open_with_config(tmp.path(), Config::new().flush_on_shutdown(false)).unwrap();
        store.save(doc("volatile"));
        store.close().unwrap();
    }

    let store = Store::open(tmp.path()).unwrap();
    assert!(!store.has_any_entry());
}

#[test]
fn in_flight_entries_are_requeued_after_restart() {
    let tmp = tempdir().unwrap();
    {
        let store = Store::open(tmp.path()).unwrap();
        store.save(doc("a"));
        let peeked = store.peek_oldest().wait().unwrap().unwrap();
        assert_eq!(name_of(&peeked.payload), "a");
    }

    // In-flight state is process-local
    let store = Store::open(tmp.path()).unwrap();
    let peeked = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(name_of(&peeked.payload), "a");
}

#[test]
fn stale_temp_files_are_removed_on_open() {
    let tmp = tempdir().unwrap();
    let temp = tmp
        .path()
        .join(".00000000000000000001-0123456789abcdef0123456789abcdef.tmp");
    fs::write(&temp, b"partial").unwrap();
    fs::write(tmp.path().join("notes.txt"), b"not an entry").unwrap();

    let store = Store::open(tmp.path()).unwrap();
    assert!(!temp.exists());
    assert!(!store.has_any_entry());
    assert!(tmp.path().join("notes.txt").exists());
}

#[test]
fn open_is_singleton_per_canonical_path() {
    let tmp = tempdir().unwrap();
    let a = Store::open(tmp.path().join("spool")).unwrap();
    let b = Store::open(tmp.path().join("spool").join("..").join("spool")).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    a.save(doc("shared"));
    assert_eq!(b.list_keys().wait().unwrap().len(), 1);
}

#[test]
fn open_fails_for_plain_file() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("file");
    fs::write(&file, b"x").unwrap();

    let result = Store::open(&file);
    assert!(matches!(result, Err(CoreError::DirectoryUnavailable { .. })));
}

#[test]
fn open_fails_when_creation_disabled() {
    let tmp = tempdir().unwrap();
    let result = Store::open_with_config(
        tmp.path().join("absent"),
        Config::new().create_if_missing(false),
    );
    assert!(matches!(result, Err(CoreError::DirectoryUnavailable { .. })));
}

#[test]
fn write_failures_are_counted_not_raised() {
    let backend = InMemoryBackend::new();
    let store = Store::open_with_backend(backend.clone(), Config::new().max_mem_cache_size(0))
        .unwrap();

    backend.set_fail_writes(true);
    let key = store.save_with_key(doc("a")).wait().unwrap();
    assert_eq!(store.stats().write_failures, 1);
    assert!(!store.flush_memory_to_disk().wait().unwrap());

    // Entry still served from memory
    assert_eq!(store.get_payload(&key).wait().unwrap(), Some(doc("a")));

    backend.set_fail_writes(false);
    assert!(store.flush_memory_to_disk().wait().unwrap());
    assert_eq!(backend.len(), 1);
}

#[test]
fn corrupt_entry_is_skipped_by_peek() {
    let backend = InMemoryBackend::new();
    let bad = EntryKey::generate(spool_core::SequenceNumber::new(1));
    backend.insert_raw(bad.as_str(), vec![0xff, 0xff, 0xff]);
    let good = EntryKey::generate(spool_core::SequenceNumber::new(2));
    backend.insert_raw(
        good.as_str(),
        spool_codec::encode_document(&doc("good")).unwrap(),
    );

    let store = Store::open_with_backend(backend, Config::default()).unwrap();
    assert_eq!(store.stats().total, 2);

    let peeked = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(peeked.key, good.as_str());
    assert_eq!(store.stats().discarded, 1);
    assert_eq!(store.list_keys().wait().unwrap(), vec![good.to_string()]);
}

#[test]
fn nan_payload_survives_reopen() {
    let tmp = tempdir().unwrap();
    let key = {
        let store =
            Store::open_with_config(tmp.path(), Config::new().max_mem_cache_size(0)).unwrap();
        let key = store
            .save_with_key(Document::new().with("reading", f64::NAN))
            .wait()
            .unwrap();
        store.save(doc("after"));
        assert_eq!(store.list_keys().wait().unwrap().len(), 2);
        assert_eq!(store.stats().memory, 0);
        assert_eq!(store.stats().write_failures, 0);
        store.close().unwrap();
        key
    };

    let store = Store::open(tmp.path()).unwrap();
    let payload = store.get_payload(&key).wait().unwrap().unwrap();
    let reading = payload.get("reading").and_then(Value::as_float).unwrap();
    assert!(reading.is_nan());
}

#[test]
fn recovery_at_sequence_ceiling_opens_and_drains() {
    let backend = InMemoryBackend::new();
    let last = EntryKey::generate(spool_core::SequenceNumber::new(u64::MAX));
    backend.insert_raw(
        last.as_str(),
        spool_codec::encode_document(&doc("last")).unwrap(),
    );

    let store = Store::open_with_backend(backend, Config::default()).unwrap();
    assert_eq!(store.stats().total, 1);

    let err = store.save_with_key(doc("late")).wait().unwrap_err();
    assert!(matches!(err, CoreError::SequenceExhausted { last: u64::MAX }));
    store.save(doc("dropped"));
    assert_eq!(store.list_keys().wait().unwrap(), vec![last.to_string()]);

    let peeked = store.peek_oldest().wait().unwrap().unwrap();
    assert_eq!(name_of(&peeked.payload), "last");
    assert!(store.delete(peeked.key).wait().unwrap());
}

#[test]
fn tunables_are_ordered_with_operations() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    for i in 0..10 {
        store.save(doc(&i.to_string()));
    }
    store.set_max_mem_cache_size(2);
    store.set_max_file_size(5);

    let config = store.config().wait().unwrap();
    assert_eq!(config.max_mem_cache_size, 2);
    assert_eq!(config.max_file_size, 5);

    // One eviction check per change: floor(10 * 5%) rounds up to a single entry
    let stats = store.stats();
    assert_eq!(stats.total, 9);
    assert_eq!(stats.evicted, 1);
    assert_eq!(stats.memory, 2);
}

#[test]
fn callbacks_receive_results() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    store.save(doc("a"));

    let (tx, rx) = mpsc::channel();
    store.list_keys().then(move |keys| {
        tx.send(keys.unwrap().len()).unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
}

#[test]
fn operations_after_close_report_stopped() {
    let store = Store::open_with_backend(InMemoryBackend::new(), Config::default()).unwrap();
    store.close().unwrap();

    assert!(matches!(
        store.peek_oldest().wait(),
        Err(CoreError::ExecutorStopped)
    ));
    // Fire-and-forget calls are dropped quietly
    store.save(doc("late"));
    store.return_oldest("whatever");
}
