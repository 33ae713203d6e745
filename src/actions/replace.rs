//! Replace a duplicate file with a symbolic link to its canonical copy.
//!
//! # Overview
//!
//! Each replacement is three filesystem operations:
//!
//! 1. **Stage** - rename the duplicate to a hidden sibling name
//! 2. **Link** - create a symbolic link at the duplicate's path pointing at
//!    the canonical file (relative target, same directory)
//! 3. **Cleanup** - remove the staged file
//!
//! Each operation is atomic on its own; the sequence is not, so a failed
//! link is rolled back by renaming the staged file to its original name.
//!
//! ```text
//! Pending --stage--> Staged --link--> Linked --cleanup--> Done
//!                      |
//!                      +--link failed, rename back ok-----> RolledBack
//!                      +--link failed, rename back failed-> Unrecoverable
//! ```
//!
//! A failed cleanup is retried and then tolerated: the link is already
//! correct, only a stray staging file remains.
//!
//! All mutation goes through the [`LinkFs`] trait so failures can be
//! injected in tests.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::actions::{Replacer, StdFs};
//! use std::ffi::OsStr;
//! use std::path::Path;
//!
//! let replacer = Replacer::new(StdFs);
//! let done = replacer
//!     .replace(Path::new("/photos"), OsStr::new("a.webp"), OsStr::new("b.webp"))
//!     .unwrap();
//! assert!(done.cleanup_warning.is_none());
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

/// Extension marking staging files.
pub const STAGING_EXTENSION: &str = "ldstage";

/// Default number of extra cleanup attempts after the first failure.
pub const DEFAULT_CLEANUP_RETRIES: u32 = 1;

const MAX_STAGING_ATTEMPTS: usize = 16;

// Shortest generated suffix: one pid digit, eight clock digits, one counter digit.
const MIN_STAGING_SUFFIX_LEN: usize = 10;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem primitives used by the replacer.
pub trait LinkFs {
    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a symbolic link at `link` whose target is `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

impl<T: LinkFs + ?Sized> LinkFs for &T {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        (**self).symlink(target, link)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl LinkFs for StdFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, _link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Where a replacement ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceState {
    /// Nothing has been done to the duplicate.
    Pending,
    /// The duplicate sits under its staging name.
    Staged,
    /// The link exists; the staged file has not been removed yet.
    Linked,
    /// The link exists (a staging file may remain, see the warning).
    Done,
    /// The link failed and the duplicate was restored.
    RolledBack,
    /// The link failed and the duplicate could not be restored.
    Unrecoverable,
}

impl fmt::Display for ReplaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Staged => "staged",
            Self::Linked => "linked",
            Self::Done => "done",
            Self::RolledBack => "rolled back",
            Self::Unrecoverable => "unrecoverable",
        };
        f.write_str(name)
    }
}

/// A replacement that could not be completed. Every variant is fatal for
/// the run.
#[derive(Debug, Error)]
pub enum ReplaceError {
    /// The duplicate could not be renamed to its staging name. It is untouched.
    #[error("failed to stage {path}: {source}")]
    StageFailed {
        /// Duplicate path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The link could not be created; the duplicate was restored.
    #[error("failed to link {path} -> {target} (original restored): {source}")]
    LinkFailedRolledBack {
        /// Duplicate path
        path: PathBuf,
        /// Link target (canonical file name)
        target: PathBuf,
        /// Error from creating the link
        #[source]
        source: io::Error,
    },

    /// The link could not be created and the duplicate could not be
    /// restored. Its content is only reachable through `staged`.
    #[error(
        "failed to link {path} ({link_error}) and failed to restore it ({rollback_error}); \
         original content is in {staged}"
    )]
    LinkFailedRollbackFailed {
        /// Duplicate path
        path: PathBuf,
        /// Staging path now holding the original bytes
        staged: PathBuf,
        /// Error from creating the link
        link_error: io::Error,
        /// Error from renaming the staged file back
        rollback_error: io::Error,
    },
}

impl ReplaceError {
    /// Terminal state of the failed replacement.
    #[must_use]
    pub fn state(&self) -> ReplaceState {
        match self {
            Self::StageFailed { .. } => ReplaceState::Pending,
            Self::LinkFailedRolledBack { .. } => ReplaceState::RolledBack,
            Self::LinkFailedRollbackFailed { .. } => ReplaceState::Unrecoverable,
        }
    }

    /// True when the directory was left inconsistent.
    #[must_use]
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::LinkFailedRollbackFailed { .. })
    }

    /// Duplicate path the failure is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::StageFailed { path, .. }
            | Self::LinkFailedRolledBack { path, .. }
            | Self::LinkFailedRollbackFailed { path, .. } => path,
        }
    }
}

/// A staging file that could not be removed.
#[derive(Debug)]
pub struct CleanupWarning {
    /// Path of the leftover staging file
    pub staged: PathBuf,
    /// Error from the last removal attempt
    pub source: io::Error,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not remove staging file {}: {}",
            self.staged.display(),
            self.source
        )
    }
}

/// A completed replacement.
#[derive(Debug)]
pub struct Replacement {
    /// Path that is now a symbolic link
    pub path: PathBuf,
    /// Link target, relative to the link's directory
    pub target: PathBuf,
    /// Set when the staging file is still on disk
    pub cleanup_warning: Option<CleanupWarning>,
}

impl Replacement {
    /// Final state (always [`ReplaceState::Done`]).
    #[must_use]
    pub fn state(&self) -> ReplaceState {
        ReplaceState::Done
    }
}

/// Performs stage / link / cleanup for one duplicate at a time.
#[derive(Debug, Clone)]
pub struct Replacer<F: LinkFs = StdFs> {
    fs: F,
    cleanup_retries: u32,
}

impl Default for Replacer<StdFs> {
    fn default() -> Self {
        Self::new(StdFs)
    }
}

impl<F: LinkFs> Replacer<F> {
    /// Create a replacer over the given filesystem.
    #[must_use]
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            cleanup_retries: DEFAULT_CLEANUP_RETRIES,
        }
    }

    /// Set how many times a failed cleanup is retried.
    #[must_use]
    pub fn with_cleanup_retries(mut self, retries: u32) -> Self {
        self.cleanup_retries = retries;
        self
    }

    /// Configured cleanup retry count.
    #[must_use]
    pub fn cleanup_retries(&self) -> u32 {
        self.cleanup_retries
    }

    /// The underlying filesystem.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Replace `dir/duplicate` with a link to `canonical`.
    ///
    /// The link target is the bare canonical file name, so it resolves
    /// relative to `dir`.
    ///
    /// # Errors
    ///
    /// See [`ReplaceError`]; every variant means the run must stop.
    pub fn replace(
        &self,
        dir: &Path,
        canonical: &OsStr,
        duplicate: &OsStr,
    ) -> Result<Replacement, ReplaceError> {
        let path = dir.join(duplicate);
        let target = PathBuf::from(canonical);
        let staged = staging_path(dir, duplicate);

        // Pending -> Staged
        self.fs
            .rename(&path, &staged)
            .map_err(|source| ReplaceError::StageFailed {
                path: path.clone(),
                source,
            })?;
        log::trace!("{}: {} as {}", ReplaceState::Staged, path.display(), staged.display());

        // Staged -> Linked
        if let Err(link_error) = self.fs.symlink(&target, &path) {
            return Err(match self.fs.rename(&staged, &path) {
                Ok(()) => {
                    log::trace!("{}: {}", ReplaceState::RolledBack, path.display());
                    ReplaceError::LinkFailedRolledBack {
                        path,
                        target,
                        source: link_error,
                    }
                }
                Err(rollback_error) => {
                    log::error!(
                        "UNRECOVERABLE: {} could not be linked or restored; its content is in {}",
                        path.display(),
                        staged.display()
                    );
                    ReplaceError::LinkFailedRollbackFailed {
                        path,
                        staged,
                        link_error,
                        rollback_error,
                    }
                }
            });
        }
        log::trace!("{}: {} -> {}", ReplaceState::Linked, path.display(), target.display());

        // Linked -> Done
        let cleanup_warning = self.cleanup(&staged);
        log::trace!("{}: {}", ReplaceState::Done, path.display());

        Ok(Replacement {
            path,
            target,
            cleanup_warning,
        })
    }

    fn cleanup(&self, staged: &Path) -> Option<CleanupWarning> {
        let mut attempt = 0;
        loop {
            match self.fs.remove_file(staged) {
                Ok(()) => return None,
                Err(e) if attempt < self.cleanup_retries => {
                    attempt += 1;
                    log::debug!(
                        "Retrying removal of {} ({}/{}): {}",
                        staged.display(),
                        attempt,
                        self.cleanup_retries,
                        e
                    );
                }
                Err(source) => {
                    let warning = CleanupWarning {
                        staged: staged.to_path_buf(),
                        source,
                    };
                    log::warn!("{}", warning);
                    return Some(warning);
                }
            }
        }
    }
}

/// Whether a file name has the exact shape of one of our staging files:
/// `.NAME.HEX.ldstage` with a lowercase hex suffix as generated here.
#[must_use]
pub fn is_staging_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    let Some(inner) = name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(STAGING_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return false;
    };
    inner.rsplit_once('.').is_some_and(|(base, suffix)| {
        !base.is_empty()
            && suffix.len() >= MIN_STAGING_SUFFIX_LEN
            && suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// Pick an unused staging path next to `duplicate`.
///
/// The suffix mixes the process id, the clock and a process-wide counter;
/// a name that already exists is redrawn.
fn staging_path(dir: &Path, duplicate: &OsStr) -> PathBuf {
    let mut candidate = dir.join(staging_name(duplicate));
    for _ in 1..MAX_STAGING_ATTEMPTS {
        if std::fs::symlink_metadata(&candidate).is_err() {
            break;
        }
        candidate = dir.join(staging_name(duplicate));
    }
    candidate
}

fn staging_name(duplicate: &OsStr) -> OsString {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let counter = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut name = OsString::from(".");
    name.push(duplicate);
    name.push(format!(
        ".{:x}{:08x}{:x}.{}",
        std::process::id(),
        nanos,
        counter,
        STAGING_EXTENSION
    ));
    name
}
