//! Inspect command implementation.

use super::{open_existing, CommandResult};
use serde::Serialize;
use std::path::Path;

/// Spool inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Canonical spool path.
    pub path: String,
    /// Entries in the spool.
    pub entries: u64,
    /// Entries whose payload file is present.
    pub on_disk: u64,
    /// Key of the oldest entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<String>,
    /// Key of the newest entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<String>,
}

/// Gathers the inspection result for a spool directory.
///
/// Caps are configured per process and never written to the directory, so
/// only what is on disk is reported.
pub fn inspect(path: &Path) -> CommandResult<InspectResult> {
    let store = open_existing(path)?;
    let keys = store.list_keys().wait()?;
    let stats = store.stats();

    let result = InspectResult {
        path: store.dir_path().display().to_string(),
        entries: stats.total,
        on_disk: stats.disk,
        oldest: keys.first().cloned(),
        newest: keys.last().cloned(),
    };
    store.close()?;
    Ok(result)
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> CommandResult {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Spool: {}", result.path);
    println!();
    println!("Entries:      {}", result.entries);
    println!("  on disk:    {}", result.on_disk);
    if let (Some(oldest), Some(newest)) = (&result.oldest, &result.newest) {
        println!();
        println!("Oldest:       {oldest}");
        println!("Newest:       {newest}");
    }
}
