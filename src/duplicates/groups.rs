//! Content-equivalence grouping.
//!
//! # Overview
//!
//! Fingerprinted entries are partitioned by digest into
//! [`EquivalenceClass`]es. Each class keeps one canonical file and the
//! ordered list of duplicates that will be replaced by links to it.
//!
//! Grouping is a pure function: the classes are built in a scratch map,
//! then frozen into an immutable [`DuplicateClasses`] value that the
//! replacement phase only reads.
//!
//! ## Canonical selection
//!
//! The canonical file is the entry with the lexicographically smallest
//! name (OS string order). The rule does not depend on the order entries
//! arrive in, so two runs over the same directory always keep the same
//! file.
//!
//! Symbolic links never take part in grouping: they are neither canonical
//! nor duplicates, so a second run never links a link.
//!
//! # Example
//!
//! ```
//! use linkdupe::duplicates::group_by_digest;
//! use linkdupe::scanner::Entry;
//!
//! let entries = vec![
//!     Entry::new("b.txt", [1u8; 32], 10),
//!     Entry::new("a.txt", [1u8; 32], 10),
//!     Entry::new("c.txt", [2u8; 32], 10),
//! ];
//!
//! let (classes, stats) = group_by_digest(&entries);
//! assert_eq!(classes.len(), 1);
//! assert_eq!(stats.duplicate_files, 1);
//!
//! let class = classes.iter().next().unwrap();
//! assert_eq!(class.canonical, "a.txt");
//! assert_eq!(class.duplicates, vec!["b.txt"]);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;

use crate::scanner::{hash_to_hex, Entry, Hash};

/// Files sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// BLAKE3 digest shared by every member
    pub digest: Hash,
    /// Size in bytes of each member
    pub size: u64,
    /// The file that is kept as a regular file
    pub canonical: OsString,
    /// Files to be replaced by links to `canonical`, in name order
    pub duplicates: Vec<OsString>,
}

impl EquivalenceClass {
    /// Digest as a hex string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }

    /// Bytes freed once every duplicate is a link.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }
}

/// Immutable set of equivalence classes with at least one duplicate.
///
/// Iteration order is by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateClasses {
    classes: Vec<EquivalenceClass>,
    by_digest: HashMap<Hash, usize>,
}

impl DuplicateClasses {
    /// Look up the class for a digest.
    #[must_use]
    pub fn get(&self, digest: &Hash) -> Option<&EquivalenceClass> {
        self.by_digest.get(digest).map(|&idx| &self.classes[idx])
    }

    /// Iterate classes in canonical-name order.
    pub fn iter(&self) -> std::slice::Iter<'_, EquivalenceClass> {
        self.classes.iter()
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when there is nothing to replace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Total number of duplicates across all classes.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.classes.iter().map(|c| c.duplicates.len()).sum()
    }

    fn freeze(mut classes: Vec<EquivalenceClass>) -> Self {
        classes.sort_by(|a, b| a.canonical.cmp(&b.canonical));
        let by_digest = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.digest, idx))
            .collect();
        Self { classes, by_digest }
    }
}

impl<'a> IntoIterator for &'a DuplicateClasses {
    type Item = &'a EquivalenceClass;
    type IntoIter = std::slice::Iter<'a, EquivalenceClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Statistics from grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Entries passed in
    pub total_entries: usize,
    /// Entries excluded because they were symbolic links
    pub skipped_links: usize,
    /// Distinct digests among non-link entries
    pub unique_digests: usize,
    /// Classes with at least one duplicate
    pub duplicate_classes: usize,
    /// Number of files that will become links
    pub duplicate_files: usize,
    /// Bytes freed once every duplicate is a link
    pub reclaimable_bytes: u64,
}

/// Partition entries into equivalence classes by digest.
///
/// Links are filtered out, the smallest name in each bucket becomes
/// canonical, and buckets without duplicates are dropped.
#[must_use]
pub fn group_by_digest(entries: &[Entry]) -> (DuplicateClasses, GroupingStats) {
    let mut stats = GroupingStats {
        total_entries: entries.len(),
        ..Default::default()
    };

    let mut buckets: HashMap<Hash, Vec<&Entry>> = HashMap::with_capacity(entries.len());
    for entry in entries {
        if entry.is_symlink {
            log::trace!(
                "Excluding symbolic link from grouping: {}",
                entry.name.to_string_lossy()
            );
            stats.skipped_links += 1;
            continue;
        }
        buckets.entry(entry.digest).or_default().push(entry);
    }
    stats.unique_digests = buckets.len();

    let classes: Vec<EquivalenceClass> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(digest, mut members)| {
            members.sort_by(|a, b| a.name.cmp(&b.name));
            let canonical = members[0];
            let class = EquivalenceClass {
                digest,
                size: canonical.size,
                canonical: canonical.name.clone(),
                duplicates: members[1..].iter().map(|e| e.name.clone()).collect(),
            };
            log::debug!(
                "Class {}: keeping {}, {} duplicate(s)",
                class.digest_hex(),
                class.canonical.to_string_lossy(),
                class.duplicates.len()
            );
            class
        })
        .collect();

    stats.duplicate_classes = classes.len();
    stats.duplicate_files = classes.iter().map(|c| c.duplicates.len()).sum();
    stats.reclaimable_bytes = classes.iter().map(EquivalenceClass::reclaimable).sum();

    (DuplicateClasses::freeze(classes), stats)
}
