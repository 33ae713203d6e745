//! Command-line interface definitions for linkdupe.
//!
//! # Example
//!
//! ```bash
//! # Replace duplicates in ~/Pictures/export with links
//! linkdupe ~/Pictures/export
//!
//! # Show what would be linked without touching anything
//! linkdupe --dry-run ~/Pictures/export
//!
//! # Machine-readable summary
//! linkdupe --output json ~/Pictures/export
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replace duplicate files with symbolic links to one retained copy.
///
/// Files in DIR with identical content are collapsed: the file with the
/// smallest name is kept, every other copy becomes a relative symbolic link
/// to it. Subdirectories and existing links are left alone.
#[derive(Debug, Parser)]
#[command(name = "linkdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to deduplicate (not traversed recursively)
    #[arg(value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report the links that would be created without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Number of threads used for hashing (overrides config)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    pub io_threads: Option<usize>,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE", env = "LINKDUPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
