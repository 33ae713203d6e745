//! Output formatters for run summaries.
//!
//! - [`text`]: human-readable lines for the terminal
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::dedupe::Deduplicator;
//! use linkdupe::error::ExitCode;
//! use linkdupe::output::JsonOutput;
//! use std::path::Path;
//!
//! let summary = Deduplicator::with_defaults().run(Path::new(".")).unwrap();
//! let output = JsonOutput::new(&summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
