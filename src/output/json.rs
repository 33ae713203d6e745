//! JSON output formatter for run summaries.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "directory": "/photos",
//!   "outcome": "deduplicated",
//!   "links": [
//!     { "path": "/photos/b.webp", "target": "a.webp", "size": 1024 }
//!   ],
//!   "cleanup_warnings": [],
//!   "stale_staging": [],
//!   "summary": {
//!     "files_scanned": 3,
//!     "links_skipped": 0,
//!     "other_skipped": 0,
//!     "duplicate_classes": 1,
//!     "duplicates_replaced": 1,
//!     "bytes_reclaimed": 1024,
//!     "exit_code": 0,
//!     "exit_code_name": "LD000"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dedupe::{PlannedLink, RunOutcome, RunSummary};
use crate::error::ExitCode;

/// One link in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLink {
    /// Path of the duplicate (now, or in a dry run soon, a link)
    pub path: String,
    /// Link target relative to the link's directory
    pub target: String,
    /// Size in bytes
    pub size: u64,
}

impl From<&PlannedLink> for JsonLink {
    fn from(link: &PlannedLink) -> Self {
        Self {
            path: path_string(&link.path),
            target: path_string(&link.target),
            size: link.size,
        }
    }
}

/// Counters in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files fingerprinted
    pub files_scanned: usize,
    /// Existing symbolic links left alone
    pub links_skipped: usize,
    /// Subdirectories and special files left alone
    pub other_skipped: usize,
    /// Classes with at least one duplicate
    pub duplicate_classes: usize,
    /// Duplicates replaced with links
    pub duplicates_replaced: usize,
    /// Bytes freed, or freeable in a dry run
    pub bytes_reclaimed: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "LD000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Target directory
    pub directory: String,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Links created or planned
    pub links: Vec<JsonLink>,
    /// Staging files that could not be removed
    pub cleanup_warnings: Vec<String>,
    /// Leftover staging files from an earlier run
    pub stale_staging: Vec<String>,
    /// Counters
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a JSON output from a run summary and exit code.
    #[must_use]
    pub fn new(summary: &RunSummary, exit_code: ExitCode) -> Self {
        Self {
            directory: path_string(&summary.directory),
            outcome: summary.outcome,
            links: summary.links.iter().map(JsonLink::from).collect(),
            cleanup_warnings: summary.cleanup_warnings.iter().map(|p| path_string(p)).collect(),
            stale_staging: summary.stale_staging.iter().map(|p| path_string(p)).collect(),
            summary: JsonSummary {
                files_scanned: summary.files_scanned,
                links_skipped: summary.links_skipped,
                other_skipped: summary.other_skipped,
                duplicate_classes: summary.duplicate_classes,
                duplicates_replaced: summary.duplicates_replaced,
                bytes_reclaimed: summary.bytes_reclaimed,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
