//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Parallel content fingerprinting on a bounded thread pool
//! - Grouping fingerprinted files into equivalence classes

pub mod finder;
pub mod groups;

pub use finder::{fingerprint, FingerprintConfig, FingerprintError, DEFAULT_IO_THREADS};
pub use groups::{group_by_digest, DuplicateClasses, EquivalenceClass, GroupingStats};
