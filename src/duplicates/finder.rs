//! Fingerprint phase: parallel hashing with an all-or-nothing barrier.
//!
//! # Overview
//!
//! Every listed regular file is hashed on a dedicated rayon pool limited to
//! `io_threads` workers. The phase returns only after every file has been
//! hashed; a single read failure fails the whole phase, because grouping a
//! partial set of fingerprints could pick the wrong canonical file.
//!
//! Symbolic links are not hashed. They are carried through as entries
//! flagged `is_symlink` with no content identity so the grouper can
//! account for and exclude them.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::duplicates::{fingerprint, FingerprintConfig};
//! use linkdupe::scanner::{list_directory, Hasher};
//! use std::path::Path;
//!
//! let listing = list_directory(Path::new(".")).unwrap();
//! let entries = fingerprint(&listing.files, &Hasher::new(), &FingerprintConfig::default()).unwrap();
//! println!("{} entries", entries.len());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::progress::{ProgressCallback, PHASE_FINGERPRINT};
use crate::scanner::{Entry, HashError, Hasher, ListedFile};

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the fingerprint phase.
#[derive(Clone)]
pub struct FingerprintConfig {
    /// Number of I/O threads for parallel hashing.
    pub io_threads: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FingerprintConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintConfig")
            .field("io_threads", &self.io_threads)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            progress_callback: None,
        }
    }
}

impl FingerprintConfig {
    /// Set the I/O thread count (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Errors from the fingerprint phase.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// A file could not be read.
    #[error(transparent)]
    Read(#[from] HashError),

    /// The hashing thread pool could not be created.
    #[error("failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Hash every listed file, in parallel.
///
/// The returned entries keep the order of `files`.
///
/// # Errors
///
/// Returns the first [`HashError`] (in listing order) if any file could not
/// be read, or [`FingerprintError::ThreadPool`] if no pool could be built.
pub fn fingerprint(
    files: &[ListedFile],
    hasher: &Hasher,
    config: &FingerprintConfig,
) -> Result<Vec<Entry>, FingerprintError> {
    if files.is_empty() {
        log::debug!("Fingerprint: no files to process");
        return Ok(Vec::new());
    }

    let to_hash = files.iter().filter(|f| !f.is_symlink).count();
    log::info!(
        "Fingerprinting {} files on {} threads",
        to_hash,
        config.io_threads
    );

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_FINGERPRINT, to_hash);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads.max(1))
        .thread_name(|i| format!("linkdupe-hash-{}", i))
        .build()?;

    let completed = AtomicUsize::new(0);
    let results: Vec<Result<Entry, HashError>> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                if file.is_symlink {
                    return Ok(Entry {
                        name: file.name.clone(),
                        digest: [0u8; 32],
                        size: file.size,
                        is_symlink: true,
                    });
                }

                let digest = hasher.full_hash(&file.path)?;
                log::trace!("Fingerprinted {}", file.path.display());

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(done, file.path.to_string_lossy().as_ref());
                }

                Ok(Entry::new(file.name.clone(), digest, file.size))
            })
            .collect()
    });

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_FINGERPRINT);
    }

    let entries = results.into_iter().collect::<Result<Vec<_>, _>>().map_err(|e| {
        log::error!("Failed to fingerprint {}: {}", e.path().display(), e);
        e
    })?;

    log::debug!("Fingerprinted {} files", to_hash);
    Ok(entries)
}
