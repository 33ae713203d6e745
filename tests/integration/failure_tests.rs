//! Failure injection through a [`LinkFs`] wrapper around the real
//! filesystem.

#![cfg(unix)]

use linkdupe::actions::{LinkFs, ReplaceError, StdFs};
use linkdupe::dedupe::{DedupeConfig, DedupeError, Deduplicator, RunOutcome};
use linkdupe::error::ExitCode;
use std::cell::Cell;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Delegates to [`StdFs`] but fails selected operations.
#[derive(Default)]
struct FaultyFs {
    /// Fail a rename whose source has this file name (the stage step).
    fail_stage_for: Option<&'static str>,
    /// Fail `symlink` when the link has this file name.
    fail_link_for: Option<&'static str>,
    /// Fail a rename whose destination has this file name, after the
    /// first such rename succeeded (the stage step).
    fail_restore_for: Option<&'static str>,
    /// Fail every `remove_file`.
    fail_cleanup: bool,
    renames_to_target: Cell<u32>,
    removals: Cell<u32>,
}

impl FaultyFs {
    fn injected(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "injected failure")
    }

    fn named(path: &Path, name: Option<&'static str>) -> bool {
        name.is_some_and(|n| path.file_name() == Some(OsStr::new(n)))
    }
}

impl LinkFs for FaultyFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if Self::named(from, self.fail_stage_for) {
            return Err(Self::injected(io::ErrorKind::PermissionDenied));
        }
        if Self::named(to, self.fail_restore_for) {
            self.renames_to_target.set(self.renames_to_target.get() + 1);
            return Err(Self::injected(io::ErrorKind::PermissionDenied));
        }
        StdFs.rename(from, to)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        if Self::named(link, self.fail_link_for) {
            return Err(Self::injected(io::ErrorKind::PermissionDenied));
        }
        StdFs.symlink(target, link)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.fail_cleanup {
            self.removals.set(self.removals.get() + 1);
            return Err(Self::injected(io::ErrorKind::PermissionDenied));
        }
        StdFs.remove_file(path)
    }
}

/// `a1`/`a2` share content, `b1`/`b2` share other content. Classes are
/// processed in canonical order, so `a2` is replaced before `b2`.
fn two_classes() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a1"), b"alpha").unwrap();
    fs::write(dir.path().join("a2"), b"alpha").unwrap();
    fs::write(dir.path().join("b1"), b"bravo").unwrap();
    fs::write(dir.path().join("b2"), b"bravo").unwrap();
    dir
}

fn three_classes() -> tempfile::TempDir {
    let dir = two_classes();
    fs::write(dir.path().join("c1"), b"charlie").unwrap();
    fs::write(dir.path().join("c2"), b"charlie").unwrap();
    dir
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_link_failure_keeps_earlier_replacements() {
    let dir = two_classes();
    let fs_impl = FaultyFs {
        fail_link_for: Some("b2"),
        ..FaultyFs::default()
    };

    let err = Deduplicator::with_fs(DedupeConfig::default(), &fs_impl)
        .run(dir.path())
        .unwrap_err();

    match &err {
        DedupeError::Replace { replaced, source } => {
            assert_eq!(*replaced, 1);
            assert!(matches!(source, ReplaceError::LinkFailedRolledBack { .. }));
            assert_eq!(source.path(), dir.path().join("b2").as_path());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Earlier replacement stays, failed duplicate is restored
    assert_eq!(fs::read_link(dir.path().join("a2")).unwrap(), PathBuf::from("a1"));
    let b2 = fs::symlink_metadata(dir.path().join("b2")).unwrap();
    assert!(b2.file_type().is_file());
    assert_eq!(fs::read(dir.path().join("b2")).unwrap(), b"bravo");
    assert_eq!(names_in(dir.path()), ["a1", "a2", "b1", "b2"]);

    let code = ExitCode::classify(&anyhow::Error::new(err));
    assert_eq!(code, ExitCode::FilesystemError);
}

#[test]
fn test_stage_failure_stops_the_run() {
    let dir = three_classes();
    let fs_impl = FaultyFs {
        fail_stage_for: Some("b2"),
        ..FaultyFs::default()
    };

    let err = Deduplicator::with_fs(DedupeConfig::default(), &fs_impl)
        .run(dir.path())
        .unwrap_err();

    match &err {
        DedupeError::Replace { replaced, source } => {
            assert_eq!(*replaced, 1);
            assert!(matches!(source, ReplaceError::StageFailed { .. }));
            assert_eq!(source.path(), dir.path().join("b2").as_path());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // a2 was replaced before the failure; b2 and c2 are untouched
    assert_eq!(fs::read_link(dir.path().join("a2")).unwrap(), PathBuf::from("a1"));
    for (name, content) in [("b2", &b"bravo"[..]), ("c2", &b"charlie"[..])] {
        let meta = fs::symlink_metadata(dir.path().join(name)).unwrap();
        assert!(meta.file_type().is_file(), "{name} was modified");
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), content);
    }
    assert_eq!(names_in(dir.path()), ["a1", "a2", "b1", "b2", "c1", "c2"]);

    let code = ExitCode::classify(&anyhow::Error::new(err));
    assert_eq!(code, ExitCode::FilesystemError);
}

#[test]
fn test_failed_rollback_is_unrecoverable() {
    let dir = two_classes();
    let fs_impl = FaultyFs {
        fail_link_for: Some("b2"),
        fail_restore_for: Some("b2"),
        ..FaultyFs::default()
    };

    let err = Deduplicator::with_fs(DedupeConfig::default(), &fs_impl)
        .run(dir.path())
        .unwrap_err();

    // Staging b2 renames away from b2, so only the restore hits the fault
    assert_eq!(fs_impl.renames_to_target.get(), 1);

    let staged = match &err {
        DedupeError::Replace {
            source: ReplaceError::LinkFailedRollbackFailed { staged, .. },
            ..
        } => staged.clone(),
        other => panic!("unexpected error: {other:?}"),
    };

    assert!(!dir.path().join("b2").exists());
    assert_eq!(fs::read(&staged).unwrap(), b"bravo");

    let code = ExitCode::classify(&anyhow::Error::new(err));
    assert_eq!(code, ExitCode::Unrecoverable);
}

#[test]
fn test_cleanup_failure_does_not_stop_the_run() {
    let dir = two_classes();
    let fs_impl = FaultyFs {
        fail_cleanup: true,
        ..FaultyFs::default()
    };
    let config = DedupeConfig::default().with_cleanup_retries(2);

    let summary = Deduplicator::with_fs(config, &fs_impl)
        .run(dir.path())
        .unwrap();

    assert_eq!(summary.outcome, RunOutcome::Deduplicated);
    assert_eq!(summary.duplicates_replaced, 2);
    assert_eq!(summary.cleanup_warnings.len(), 2);
    // One attempt plus two retries per duplicate
    assert_eq!(fs_impl.removals.get(), 6);
    assert_eq!(linkdupe::exit_code_for(&summary), ExitCode::PartialSuccess);

    assert_eq!(fs::read_link(dir.path().join("a2")).unwrap(), PathBuf::from("a1"));
    assert_eq!(fs::read_link(dir.path().join("b2")).unwrap(), PathBuf::from("b1"));
    for staged in &summary.cleanup_warnings {
        assert!(staged.exists());
    }
}

#[test]
fn test_leftover_staging_files_are_not_deduplicated() {
    let dir = two_classes();
    let fs_impl = FaultyFs {
        fail_cleanup: true,
        ..FaultyFs::default()
    };
    Deduplicator::with_fs(DedupeConfig::default(), &fs_impl)
        .run(dir.path())
        .unwrap();

    // The leftovers hold the same bytes as a1 and b1 but must be ignored
    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.outcome, RunOutcome::NoDuplicates);
    assert_eq!(summary.stale_staging.len(), 2);
    assert_eq!(summary.files_scanned, 2);
    for staged in &summary.stale_staging {
        assert!(fs::symlink_metadata(staged).unwrap().file_type().is_file());
    }
}

#[test]
fn test_read_failure_changes_nothing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = two_classes();
    let locked = dir.path().join("b2");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; nothing to test then
    if fs::read(&locked).is_ok() {
        return;
    }

    let err = Deduplicator::with_defaults().run(dir.path()).unwrap_err();
    assert!(matches!(err, DedupeError::Read(_)));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    for name in ["a1", "a2", "b1", "b2"] {
        let meta = fs::symlink_metadata(dir.path().join(name)).unwrap();
        assert!(meta.file_type().is_file(), "{name} was modified");
    }
}
