//! Trim command implementation.

use super::{open_existing, CommandResult};
use std::path::Path;

/// Applies an entry cap and returns how many entries were evicted.
///
/// Each check evicts a share of the current total, so the cap is applied
/// repeatedly until it holds.
pub fn trim(path: &Path, max_entries: usize) -> CommandResult<u64> {
    let store = open_existing(path)?;
    let before = store.stats().evicted;

    while store.stats().total > max_entries as u64 {
        let total = store.stats().total;
        store.set_max_file_size(max_entries);
        // Orders the check before reading stats again
        store.config().wait()?;
        if store.stats().total == total {
            break;
        }
    }

    let evicted = store.stats().evicted - before;
    store.close()?;
    Ok(evicted)
}

/// Runs the trim command.
pub fn run(path: &Path, max_entries: usize) -> CommandResult {
    let evicted = trim(path, max_entries)?;
    println!("Evicted {evicted} entries");
    Ok(())
}
