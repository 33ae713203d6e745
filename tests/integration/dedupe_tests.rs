#![cfg(unix)]

use linkdupe::dedupe::{DedupeConfig, Deduplicator, RunOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path).unwrap().file_type().is_symlink()
}

fn is_regular(path: &Path) -> bool {
    fs::symlink_metadata(path).unwrap().file_type().is_file()
}

#[test]
fn test_duplicates_become_relative_links() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("photo-2.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("photo-1.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("photo-3.jpg"), b"jpeg bytes").unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.outcome, RunOutcome::Deduplicated);
    assert_eq!(summary.duplicate_classes, 1);
    assert_eq!(summary.duplicates_replaced, 2);
    assert_eq!(summary.bytes_reclaimed, 20);

    assert!(is_regular(&dir.path().join("photo-1.jpg")));
    for name in ["photo-2.jpg", "photo-3.jpg"] {
        let path = dir.path().join(name);
        assert!(is_link(&path));
        assert_eq!(fs::read_link(&path).unwrap(), PathBuf::from("photo-1.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"jpeg bytes");
    }
}

#[test]
fn test_links_survive_moving_the_directory() {
    let root = tempdir().unwrap();
    let original = root.path().join("before");
    fs::create_dir(&original).unwrap();
    fs::write(original.join("a"), b"content").unwrap();
    fs::write(original.join("b"), b"content").unwrap();

    Deduplicator::with_defaults().run(&original).unwrap();

    let moved = root.path().join("after");
    fs::rename(&original, &moved).unwrap();
    assert_eq!(fs::read(moved.join("b")).unwrap(), b"content");
}

#[test]
fn test_unrelated_files_untouched() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"one").unwrap();
    fs::write(dir.path().join("b"), b"two").unwrap();
    fs::write(dir.path().join("c"), b"one").unwrap();
    fs::write(dir.path().join("d"), b"three").unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.duplicates_replaced, 1);
    assert!(is_link(&dir.path().join("c")));
    for name in ["a", "b", "d"] {
        assert!(is_regular(&dir.path().join(name)), "{name} changed");
    }
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"two");
}

#[test]
fn test_multiple_classes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("x1"), b"xxxx").unwrap();
    fs::write(dir.path().join("x2"), b"xxxx").unwrap();
    fs::write(dir.path().join("y1"), b"yy").unwrap();
    fs::write(dir.path().join("y2"), b"yy").unwrap();
    fs::write(dir.path().join("y3"), b"yy").unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.duplicate_classes, 2);
    assert_eq!(summary.duplicates_replaced, 3);
    assert_eq!(summary.bytes_reclaimed, 4 + 2 + 2);
    assert_eq!(fs::read_link(dir.path().join("x2")).unwrap(), PathBuf::from("x1"));
    assert_eq!(fs::read_link(dir.path().join("y3")).unwrap(), PathBuf::from("y1"));
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let first = Deduplicator::with_defaults().run(dir.path()).unwrap();
    assert_eq!(first.duplicates_replaced, 1);

    let second = Deduplicator::with_defaults().run(dir.path()).unwrap();
    assert_eq!(second.outcome, RunOutcome::NoDuplicates);
    assert_eq!(second.files_scanned, 1);
    assert_eq!(second.links_skipped, 1);
    assert_eq!(fs::read_link(dir.path().join("b")).unwrap(), PathBuf::from("a"));
}

#[test]
fn test_existing_links_are_not_replaced() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    std::os::unix::fs::symlink("a", dir.path().join("alias")).unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.outcome, RunOutcome::NoDuplicates);
    assert_eq!(summary.links_skipped, 1);
    assert_eq!(fs::read_link(dir.path().join("alias")).unwrap(), PathBuf::from("a"));
}

#[test]
fn test_subdirectories_are_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("a"), b"same").unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.outcome, RunOutcome::NoDuplicates);
    assert_eq!(summary.other_skipped, 1);
    assert!(is_regular(&sub.join("a")));
}

#[test]
fn test_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("empty1"), b"").unwrap();
    fs::write(dir.path().join("empty2"), b"").unwrap();

    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();

    assert_eq!(summary.duplicates_replaced, 1);
    assert_eq!(summary.bytes_reclaimed, 0);
    assert!(is_link(&dir.path().join("empty2")));
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();
    let summary = Deduplicator::with_defaults().run(dir.path()).unwrap();
    assert_eq!(summary.outcome, RunOutcome::NoFiles);
    assert_eq!(summary.files_scanned, 0);
}

#[test]
fn test_dry_run_leaves_directory_unchanged() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    fs::write(dir.path().join("c"), b"same").unwrap();

    let config = DedupeConfig::default().with_dry_run(true);
    let summary = Deduplicator::new(config).run(dir.path()).unwrap();

    assert_eq!(summary.outcome, RunOutcome::DryRun);
    assert_eq!(summary.links.len(), 2);
    assert_eq!(summary.bytes_reclaimed, 8);
    for name in ["a", "b", "c"] {
        assert!(is_regular(&dir.path().join(name)));
    }
}

#[test]
fn test_single_thread_matches_many_threads() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("f{i:02}")), format!("{}", i % 4)).unwrap();
    }

    let config = DedupeConfig::default().with_io_threads(1).with_dry_run(true);
    let one = Deduplicator::new(config).run(dir.path()).unwrap();
    let config = DedupeConfig::default().with_io_threads(8).with_dry_run(true);
    let many = Deduplicator::new(config).run(dir.path()).unwrap();

    assert_eq!(one.links, many.links);
    assert_eq!(one.duplicate_classes, 4);
    assert_eq!(one.links.len(), 16);
}

#[test]
fn test_missing_directory_fails_without_changes() {
    let dir = tempdir().unwrap();
    let result = Deduplicator::with_defaults().run(&dir.path().join("absent"));
    assert!(result.is_err());
}

#[test]
fn test_file_instead_of_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain");
    fs::write(&file, b"x").unwrap();
    let result = Deduplicator::with_defaults().run(&file);
    assert!(result.is_err());
}
