//! Flat directory listing using walkdir.
//!
//! # Overview
//!
//! Only the immediate children of the target directory are considered.
//! Subdirectories are never entered and symbolic links are never followed;
//! a link is reported with `is_symlink = true` so later phases can keep it
//! out of grouping.
//!
//! Entries are returned sorted by file name, which makes canonical
//! selection reproducible regardless of the order the filesystem yields.
//!
//! Hidden staging files left behind by an interrupted earlier run are
//! reported separately and never hashed.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ListedFile, ScanError};
use crate::actions::replace::is_staging_name;

/// Result of listing one directory.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Regular files and symbolic links, sorted by name
    pub files: Vec<ListedFile>,
    /// Leftover staging files from an earlier run
    pub stale_staging: Vec<PathBuf>,
    /// Entries that are neither regular files, links nor directories
    pub skipped_other: usize,
    /// Subdirectories (not traversed)
    pub skipped_dirs: usize,
}

impl Listing {
    /// Number of regular (non-link) files.
    #[must_use]
    pub fn regular_count(&self) -> usize {
        self.files.iter().filter(|f| !f.is_symlink).count()
    }

    /// Number of symbolic links.
    #[must_use]
    pub fn symlink_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_symlink).count()
    }
}

/// List the immediate children of `dir`.
///
/// # Errors
///
/// - [`ScanError::NotFound`] if `dir` does not exist
/// - [`ScanError::NotADirectory`] if `dir` is not a directory
/// - [`ScanError::PermissionDenied`] if `dir` cannot be read
/// - [`ScanError::Io`] for any other listing failure
pub fn list_directory(dir: &Path) -> Result<Listing, ScanError> {
    let metadata = std::fs::metadata(dir).map_err(|e| ScanError::from_io(dir, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut listing = Listing::default();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for result in walker {
        let entry = result.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(io_err) => ScanError::from_io(&path, io_err),
                None => ScanError::Io {
                    path,
                    source: std::io::Error::other("filesystem loop detected"),
                },
            }
        })?;

        let file_type = entry.file_type();
        let path = entry.path().to_path_buf();

        if file_type.is_dir() {
            log::trace!("Skipping subdirectory: {}", path.display());
            listing.skipped_dirs += 1;
            continue;
        }

        if !file_type.is_file() && !file_type.is_symlink() {
            log::debug!("Skipping special file: {}", path.display());
            listing.skipped_other += 1;
            continue;
        }

        let name = entry.file_name().to_os_string();
        if file_type.is_file() && is_staging_name(&name) {
            log::warn!(
                "Ignoring leftover staging file from an earlier run: {}",
                path.display()
            );
            listing.stale_staging.push(path);
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| match e.into_io_error() {
                Some(io_err) => ScanError::from_io(&path, io_err),
                None => ScanError::Io {
                    path: path.clone(),
                    source: std::io::Error::other("metadata unavailable"),
                },
            })?;

        listing.files.push(ListedFile {
            name,
            path,
            size: metadata.len(),
            is_symlink: file_type.is_symlink(),
        });
    }

    log::debug!(
        "Listed {}: {} files, {} links, {} subdirectories skipped",
        dir.display(),
        listing.regular_count(),
        listing.symlink_count(),
        listing.skipped_dirs
    );

    Ok(listing)
}
