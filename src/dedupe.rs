//! Run orchestration.
//!
//! # Overview
//!
//! A run has two phases separated by a barrier:
//!
//! 1. **Read phase** - list the directory, fingerprint every regular file in
//!    parallel, wait for all of them, group by digest. Any failure here
//!    aborts before the directory is modified.
//! 2. **Mutation phase** - replace duplicates one at a time, class by
//!    class, on the calling thread. The first stage or link failure aborts
//!    the run; cleanup failures are collected and the run continues.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::dedupe::{DedupeConfig, Deduplicator};
//! use std::path::Path;
//!
//! let deduplicator = Deduplicator::new(DedupeConfig::default());
//! let summary = deduplicator.run(Path::new("/photos")).unwrap();
//! println!("{} duplicates replaced", summary.duplicates_replaced);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::actions::{LinkFs, ReplaceError, Replacer, StdFs};
use crate::duplicates::{
    fingerprint, group_by_digest, FingerprintConfig, FingerprintError, DEFAULT_IO_THREADS,
};
use crate::progress::{ProgressCallback, PHASE_LINK};
use crate::scanner::{list_directory, HashError, Hasher, ScanError};

/// Configuration for a deduplication run.
#[derive(Clone)]
pub struct DedupeConfig {
    /// Number of threads used for fingerprinting.
    pub io_threads: usize,
    /// Extra attempts to remove a staging file.
    pub cleanup_retries: u32,
    /// Plan only; do not modify the directory.
    pub dry_run: bool,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DedupeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupeConfig")
            .field("io_threads", &self.io_threads)
            .field("cleanup_retries", &self.cleanup_retries)
            .field("dry_run", &self.dry_run)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            cleanup_retries: crate::actions::replace::DEFAULT_CLEANUP_RETRIES,
            dry_run: false,
            progress_callback: None,
        }
    }
}

impl DedupeConfig {
    /// Build a run configuration from the application config.
    #[must_use]
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            io_threads: config.io_threads,
            cleanup_retries: config.cleanup_retries,
            ..Self::default()
        }
    }

    /// Set the I/O thread count (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the cleanup retry count.
    #[must_use]
    pub fn with_cleanup_retries(mut self, retries: u32) -> Self {
        self.cleanup_retries = retries;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// A fatal run failure.
#[derive(Debug, Error)]
pub enum DedupeError {
    /// The directory could not be listed. Nothing was modified.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be fingerprinted. Nothing was modified.
    #[error("fingerprinting failed, no files were changed: {0}")]
    Read(#[source] HashError),

    /// A replacement failed. Earlier replacements in this run are kept.
    #[error("{source} ({replaced} duplicate(s) replaced before the failure)")]
    Replace {
        /// Duplicates successfully replaced before the failure
        replaced: usize,
        /// The failure
        #[source]
        source: ReplaceError,
    },

    /// The hashing thread pool could not be created.
    #[error("failed to build hashing thread pool: {0}")]
    ThreadPool(#[source] rayon::ThreadPoolBuildError),
}

impl From<FingerprintError> for DedupeError {
    fn from(err: FingerprintError) -> Self {
        match err {
            FingerprintError::Read(e) => Self::Read(e),
            FingerprintError::ThreadPool(e) => Self::ThreadPool(e),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The directory held no regular files.
    NoFiles,
    /// No two files share content.
    NoDuplicates,
    /// Links were planned but not created.
    DryRun,
    /// Duplicates were replaced with links.
    Deduplicated,
}

/// A link that was, or would be, created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    /// Path of the duplicate
    pub path: PathBuf,
    /// Link target (canonical file name)
    pub target: PathBuf,
    /// Size of the duplicate in bytes
    pub size: u64,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Target directory
    pub directory: PathBuf,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Regular files fingerprinted
    pub files_scanned: usize,
    /// Existing symbolic links left alone
    pub links_skipped: usize,
    /// Subdirectories and special files left alone
    pub other_skipped: usize,
    /// Leftover staging files from an earlier run
    pub stale_staging: Vec<PathBuf>,
    /// Equivalence classes with at least one duplicate
    pub duplicate_classes: usize,
    /// Duplicates replaced with links
    pub duplicates_replaced: usize,
    /// Bytes freed (or freeable in a dry run)
    pub bytes_reclaimed: u64,
    /// Staging files that could not be removed
    pub cleanup_warnings: Vec<PathBuf>,
    /// Links created, or planned in a dry run
    pub links: Vec<PlannedLink>,
}

impl RunSummary {
    fn new(directory: &Path, outcome: RunOutcome) -> Self {
        Self {
            directory: directory.to_path_buf(),
            outcome,
            files_scanned: 0,
            links_skipped: 0,
            other_skipped: 0,
            stale_staging: Vec::new(),
            duplicate_classes: 0,
            duplicates_replaced: 0,
            bytes_reclaimed: 0,
            cleanup_warnings: Vec::new(),
            links: Vec::new(),
        }
    }

    /// True if some staging files were left on disk.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.cleanup_warnings.is_empty()
    }
}

/// Runs list → fingerprint → group → replace over one directory.
pub struct Deduplicator<F: LinkFs = StdFs> {
    config: DedupeConfig,
    hasher: Hasher,
    replacer: Replacer<F>,
}

impl Deduplicator<StdFs> {
    /// Create a deduplicator over the real filesystem.
    #[must_use]
    pub fn new(config: DedupeConfig) -> Self {
        Self::with_fs(config, StdFs)
    }

    /// Create a deduplicator with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DedupeConfig::default())
    }
}

impl<F: LinkFs> Deduplicator<F> {
    /// Create a deduplicator whose mutations go through `fs`.
    #[must_use]
    pub fn with_fs(config: DedupeConfig, fs: F) -> Self {
        let replacer = Replacer::new(fs).with_cleanup_retries(config.cleanup_retries);
        Self {
            config,
            hasher: Hasher::new(),
            replacer,
        }
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &DedupeConfig {
        &self.config
    }

    /// Deduplicate `dir`.
    ///
    /// # Errors
    ///
    /// - [`DedupeError::Scan`] if the directory cannot be listed
    /// - [`DedupeError::Read`] if any file cannot be fingerprinted
    /// - [`DedupeError::Replace`] on the first stage or link failure
    pub fn run(&self, dir: &Path) -> Result<RunSummary, DedupeError> {
        log::info!("Scanning {}", dir.display());
        let listing = list_directory(dir)?;

        let mut summary = RunSummary::new(dir, RunOutcome::NoFiles);
        summary.files_scanned = listing.regular_count();
        summary.links_skipped = listing.symlink_count();
        summary.other_skipped = listing.skipped_dirs + listing.skipped_other;
        summary.stale_staging = listing.stale_staging.clone();

        if summary.files_scanned == 0 {
            log::info!("No files found in {}", dir.display());
            return Ok(summary);
        }

        // Read phase: all fingerprints or nothing
        let mut fp_config = FingerprintConfig::default().with_io_threads(self.config.io_threads);
        if let Some(ref callback) = self.config.progress_callback {
            fp_config = fp_config.with_progress_callback(Arc::clone(callback));
        }
        let entries = fingerprint(&listing.files, &self.hasher, &fp_config)?;

        let (classes, stats) = group_by_digest(&entries);
        summary.duplicate_classes = stats.duplicate_classes;

        if classes.is_empty() {
            summary.outcome = RunOutcome::NoDuplicates;
            log::info!("No duplicates among {} files", summary.files_scanned);
            return Ok(summary);
        }

        log::info!(
            "Found {} duplicate(s) in {} class(es)",
            stats.duplicate_files,
            stats.duplicate_classes
        );

        if self.config.dry_run {
            summary.outcome = RunOutcome::DryRun;
            for class in &classes {
                for duplicate in &class.duplicates {
                    summary.links.push(PlannedLink {
                        path: dir.join(duplicate),
                        target: PathBuf::from(&class.canonical),
                        size: class.size,
                    });
                }
            }
            summary.bytes_reclaimed = stats.reclaimable_bytes;
            return Ok(summary);
        }

        // Mutation phase: strictly one duplicate at a time
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_LINK, stats.duplicate_files);
        }

        let result = self.replace_all(dir, &classes, &mut summary);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_LINK);
        }
        result?;

        summary.outcome = RunOutcome::Deduplicated;
        log::info!(
            "Replaced {} duplicate(s), {} bytes reclaimed",
            summary.duplicates_replaced,
            summary.bytes_reclaimed
        );
        Ok(summary)
    }

    fn replace_all(
        &self,
        dir: &Path,
        classes: &crate::duplicates::DuplicateClasses,
        summary: &mut RunSummary,
    ) -> Result<(), DedupeError> {
        for class in classes {
            for duplicate in &class.duplicates {
                let replacement = self
                    .replacer
                    .replace(dir, &class.canonical, duplicate)
                    .map_err(|source| {
                        log::error!(
                            "Stopping after {} replacement(s): {}",
                            summary.duplicates_replaced,
                            source
                        );
                        DedupeError::Replace {
                            replaced: summary.duplicates_replaced,
                            source,
                        }
                    })?;

                log::debug!(
                    "Linked {} -> {}",
                    replacement.path.display(),
                    replacement.target.display()
                );

                if let Some(warning) = replacement.cleanup_warning {
                    summary.cleanup_warnings.push(warning.staged);
                }
                summary.duplicates_replaced += 1;
                summary.bytes_reclaimed += class.size;
                summary.links.push(PlannedLink {
                    path: replacement.path,
                    target: replacement.target,
                    size: class.size,
                });

                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(
                        summary.duplicates_replaced,
                        duplicate.to_string_lossy().as_ref(),
                    );
                }
            }
        }
        Ok(())
    }
}
