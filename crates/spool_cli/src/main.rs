//! Spool CLI
//!
//! Command-line tools for inspecting and draining spool directories.
//!
//! # Commands
//!
//! - `inspect` - Display entry counts and configuration
//! - `list` - List entry keys, oldest first
//! - `show` - Print one payload as JSON
//! - `push` - Save JSON objects as new entries
//! - `drain` - Print and delete entries from either end
//! - `trim` - Evict the oldest entries down to a cap

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spool command-line tools.
#[derive(Parser)]
#[command(name = "spool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the spool directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display entry counts and configuration
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List entry keys, oldest first
    List,

    /// Print one payload as JSON
    Show {
        /// Entry key
        key: String,
    },

    /// Save JSON objects as new entries
    Push {
        /// One JSON object per argument
        #[arg(required = true)]
        payloads: Vec<String>,
    },

    /// Print entries as JSON lines and delete them
    Drain {
        /// Maximum number of entries to drain
        #[arg(short, long)]
        limit: Option<usize>,

        /// Take the newest entries first
        #[arg(short, long)]
        newest: bool,
    },

    /// Evict the oldest entries until at most `max` remain
    Trim {
        /// Entries to keep
        #[arg(short, long)]
        max: usize,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Spool path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::List => {
            let path = cli.path.ok_or("Spool path required for list")?;
            commands::list::run(&path)?;
        }
        Commands::Show { key } => {
            let path = cli.path.ok_or("Spool path required for show")?;
            commands::show::run(&path, &key)?;
        }
        Commands::Push { payloads } => {
            let path = cli.path.ok_or("Spool path required for push")?;
            commands::push::run(&path, &payloads)?;
        }
        Commands::Drain { limit, newest } => {
            let path = cli.path.ok_or("Spool path required for drain")?;
            commands::drain::run(&path, limit, newest)?;
        }
        Commands::Trim { max } => {
            let path = cli.path.ok_or("Spool path required for trim")?;
            commands::trim::run(&path, max)?;
        }
        Commands::Version => {
            println!("Spool CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Spool Core v{}", spool_core::VERSION);
        }
    }

    Ok(())
}
