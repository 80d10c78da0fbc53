//! Push command implementation.

use super::json::document_from_json;
use super::CommandResult;
use spool_core::Store;
use std::path::Path;

/// Saves each JSON object as a new entry and returns the generated keys.
pub fn push(path: &Path, payloads: &[String]) -> CommandResult<Vec<String>> {
    // Parse everything first so a bad argument saves nothing
    let documents = payloads
        .iter()
        .map(|text| -> CommandResult<_> { Ok(document_from_json(serde_json::from_str(text)?)?) })
        .collect::<Result<Vec<_>, _>>()?;

    let store = Store::open(path)?;
    let mut keys = Vec::with_capacity(documents.len());
    for document in documents {
        keys.push(store.save_with_key(document).wait()?);
    }
    store.close()?;
    Ok(keys)
}

/// Runs the push command.
pub fn run(path: &Path, payloads: &[String]) -> CommandResult {
    for key in push(path, payloads)? {
        println!("{key}");
    }
    Ok(())
}
