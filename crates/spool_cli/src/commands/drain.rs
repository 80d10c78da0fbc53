//! Drain command implementation.

use super::json::document_to_json;
use super::{open_existing, CommandResult};
use spool_core::PeekedEntry;
use std::path::Path;
use tracing::warn;

/// Removes up to `limit` entries from one end of the spool, handing each to
/// `sink` before deleting it.
///
/// If `sink` fails the entry is returned to the queue and the error is
/// propagated. Returns the number of entries drained.
pub fn drain<F>(path: &Path, limit: Option<usize>, newest: bool, mut sink: F) -> CommandResult<usize>
where
    F: FnMut(&PeekedEntry) -> CommandResult,
{
    let store = open_existing(path)?;
    let mut drained = 0;

    while limit.map_or(true, |limit| drained < limit) {
        let peeked = if newest {
            store.peek_newest().wait()?
        } else {
            store.peek_oldest().wait()?
        };
        let Some(entry) = peeked else {
            break;
        };

        if let Err(e) = sink(&entry) {
            if newest {
                store.return_newest(entry.key);
            } else {
                store.return_oldest(entry.key);
            }
            store.close()?;
            return Err(e);
        }

        if !store.delete(entry.key.as_str()).wait()? {
            warn!(key = %entry.key, "failed to delete drained entry");
        }
        drained += 1;
    }

    store.close()?;
    Ok(drained)
}

/// Runs the drain command, printing one JSON object per line.
pub fn run(path: &Path, limit: Option<usize>, newest: bool) -> CommandResult {
    drain(path, limit, newest, |entry| {
        let line = serde_json::json!({
            "key": entry.key,
            "payload": document_to_json(&entry.payload),
        });
        println!("{line}");
        Ok(())
    })?;
    Ok(())
}
