//! List command implementation.

use super::{open_existing, CommandResult};
use std::path::Path;

/// Runs the list command: one key per line, oldest first.
pub fn run(path: &Path) -> CommandResult {
    let store = open_existing(path)?;
    for key in store.list_keys().wait()? {
        println!("{key}");
    }
    store.close()?;
    Ok(())
}
