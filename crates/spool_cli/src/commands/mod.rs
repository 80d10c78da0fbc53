//! CLI command implementations.

pub mod drain;
pub mod inspect;
pub mod json;
pub mod list;
pub mod push;
pub mod show;
pub mod trim;

use spool_core::{Config, CoreResult, Store};
use std::path::Path;
use std::sync::Arc;

/// Result type shared by the commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Opens an existing spool directory.
pub fn open_existing(path: &Path) -> CoreResult<Arc<Store>> {
    Store::open_with_config(path, Config::new().create_if_missing(false))
}
