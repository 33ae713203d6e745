//! Plain-text summary for the terminal.

use std::fmt::Write as _;
use std::io::Write;

use bytesize::ByteSize;

use crate::dedupe::{RunOutcome, RunSummary};

/// Human-readable rendering of a [`RunSummary`].
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    summary: &'a RunSummary,
}

impl<'a> TextOutput<'a> {
    /// Wrap a summary for rendering.
    #[must_use]
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }

    /// Render the summary as lines of text.
    #[must_use]
    pub fn render(&self) -> String {
        let s = self.summary;
        let mut out = String::new();

        match s.outcome {
            RunOutcome::NoFiles => {
                let _ = writeln!(out, "No files to deduplicate in {}", s.directory.display());
            }
            RunOutcome::NoDuplicates => {
                let _ = writeln!(
                    out,
                    "No duplicates among {} file(s) in {}",
                    s.files_scanned,
                    s.directory.display()
                );
            }
            RunOutcome::DryRun => {
                for link in &s.links {
                    let _ = writeln!(
                        out,
                        "would link {} -> {}",
                        link.path.display(),
                        link.target.display()
                    );
                }
                let _ = writeln!(
                    out,
                    "Dry run: {} duplicate(s) in {} class(es), {} reclaimable",
                    s.links.len(),
                    s.duplicate_classes,
                    ByteSize::b(s.bytes_reclaimed)
                );
            }
            RunOutcome::Deduplicated => {
                let _ = writeln!(
                    out,
                    "Replaced {} duplicate(s) in {} class(es), {} reclaimed",
                    s.duplicates_replaced,
                    s.duplicate_classes,
                    ByteSize::b(s.bytes_reclaimed)
                );
            }
        }

        if s.links_skipped > 0 || s.other_skipped > 0 {
            let _ = writeln!(
                out,
                "Skipped {} existing link(s) and {} other entries",
                s.links_skipped, s.other_skipped
            );
        }
        for staged in &s.stale_staging {
            let _ = writeln!(out, "warning: leftover staging file {}", staged.display());
        }
        for staged in &s.cleanup_warnings {
            let _ = writeln!(
                out,
                "warning: staging file {} could not be removed",
                staged.display()
            );
        }
        out
    }

    /// Write the rendered summary to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}
