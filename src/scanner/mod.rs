//! Scanner module for directory listing and file hashing.
//!
//! This module provides functionality for:
//! - Flat (single-level) directory listing using walkdir
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`listing`]: Directory listing and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::list_directory;
//! use std::path::Path;
//!
//! let listing = list_directory(Path::new(".")).unwrap();
//! for file in &listing.files {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod listing;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher};
pub use listing::{list_directory, Listing};

/// A directory entry observed at listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// File name, unique within the listed directory
    pub name: OsString,
    /// Full path to the entry
    pub path: PathBuf,
    /// Size in bytes (of the link itself for symbolic links)
    pub size: u64,
    /// Whether the entry is a symbolic link
    pub is_symlink: bool,
}

/// A fingerprinted file, the unit of duplicate grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File name, unique within the directory
    pub name: OsString,
    /// BLAKE3 digest of the file content
    pub digest: Hash,
    /// File size in bytes
    pub size: u64,
    /// Whether the entry was a symbolic link when listed
    pub is_symlink: bool,
}

impl Entry {
    /// Create an entry for a regular file.
    #[must_use]
    pub fn new(name: impl Into<OsString>, digest: Hash, size: u64) -> Self {
        Self {
            name: name.into(),
            digest,
            size,
            is_symlink: false,
        }
    }

    /// Mark this entry as a symbolic link.
    #[must_use]
    pub fn with_symlink(mut self, is_symlink: bool) -> Self {
        self.is_symlink = is_symlink;
        self
    }

    /// Digest as a 64-character hex string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

/// Errors that can occur while listing the target directory.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing the directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while listing.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path does not refer to a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Path of the file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::NotAFile(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
