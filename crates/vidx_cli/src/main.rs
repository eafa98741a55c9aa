//! vidx CLI
//!
//! Command-line tools for inspecting and repairing vector-index segments.
//!
//! # Commands
//!
//! - `segments` - List the segments a part serves for each index
//! - `relocate` - Move ancestors' segment files into a merged part
//! - `purge` - Drop a part's inherited segments and row-id maps
//! - `verify` - Check segment files against their checksums
//! - `events` - Dump the vector-index event log

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// vidx command-line vector-index tools.
#[derive(Parser)]
#[command(name = "vidx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the table directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Append lifecycle events to this event log file
    #[arg(global = true, long)]
    event_log: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the segments a part serves
    Segments {
        /// Part name
        #[arg(long)]
        part: String,

        /// Only this index (default: every index on the table)
        #[arg(short, long)]
        index: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Move ancestors' segment files into a merged part
    Relocate {
        /// Merged part name
        #[arg(long)]
        part: String,
    },

    /// Drop a part's inherited segments and row-id maps
    Purge {
        /// Part name
        #[arg(long)]
        part: String,

        /// Only evict this index's cache entries (files are shared)
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Check segment files against their checksums
    Verify {
        /// Part name
        #[arg(long)]
        part: String,
    },

    /// Dump the vector-index event log
    Events {
        /// Event log file
        #[arg(short, long)]
        log: PathBuf,

        /// Maximum number of records to dump
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_log = cli.event_log.as_deref();

    match cli.command {
        Commands::Segments {
            part,
            index,
            format,
        } => {
            let path = cli.path.ok_or("Table path required for segments")?;
            commands::segments::run(&path, &part, index.as_deref(), &format)?;
        }
        Commands::Relocate { part } => {
            let path = cli.path.ok_or("Table path required for relocate")?;
            commands::relocate::run(&path, &part, event_log)?;
        }
        Commands::Purge { part, index } => {
            let path = cli.path.ok_or("Table path required for purge")?;
            commands::purge::run(&path, &part, index.as_deref(), event_log)?;
        }
        Commands::Verify { part } => {
            let path = cli.path.ok_or("Table path required for verify")?;
            commands::verify::run(&path, &part)?;
        }
        Commands::Events { log, limit, format } => {
            commands::events::run(&log, limit, &format)?;
        }
        Commands::Version => {
            println!("vidx CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("vidx Core v{}", vidx_core::VERSION);
        }
    }

    Ok(())
}
