//! Show command implementation.

use super::json::document_to_json;
use super::{open_existing, CommandResult};
use std::path::Path;

/// Runs the show command: prints one payload as JSON.
pub fn run(path: &Path, key: &str) -> CommandResult {
    let store = open_existing(path)?;
    let payload = store.get_payload(key).wait()?;
    store.close()?;

    let payload = payload.ok_or_else(|| format!("no entry with key {key}"))?;
    println!("{}", serde_json::to_string_pretty(&document_to_json(&payload))?);
    Ok(())
}
