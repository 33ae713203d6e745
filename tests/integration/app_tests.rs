//! End-to-end runs through `run_app_to`, including exit-code mapping.

use clap::Parser;
use linkdupe::cli::Cli;
use linkdupe::error::ExitCode;
use linkdupe::run_app_to;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// An empty config file so the user's own config is never picked up.
fn config_file() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("linkdupe.toml");
    fs::write(&path, "").unwrap();
    (dir, path)
}

fn cli(config: &Path, args: &[&str]) -> Cli {
    let mut argv = vec!["linkdupe", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn run(cli: Cli) -> (anyhow::Result<ExitCode>, String) {
    let mut out = Vec::new();
    let result = run_app_to(cli, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn error_code(result: anyhow::Result<ExitCode>) -> ExitCode {
    ExitCode::classify(&result.unwrap_err())
}

#[test]
fn test_missing_directory_argument() {
    let (_guard, config) = config_file();
    let (result, _) = run(cli(&config, &["-q"]));
    assert_eq!(error_code(result), ExitCode::ConfigError);
}

#[test]
fn test_empty_directory_argument() {
    let (_guard, config) = config_file();
    // clap refuses an empty path, so build it directly
    let mut args = cli(&config, &["-q"]);
    args.path = Some(PathBuf::new());
    let (result, _) = run(args);
    assert_eq!(error_code(result), ExitCode::ConfigError);
}

#[test]
fn test_zero_io_threads_rejected() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();
    let (result, _) = run(cli(
        &config,
        &["-q", "--io-threads", "0", dir.path().to_str().unwrap()],
    ));
    assert_eq!(error_code(result), ExitCode::ConfigError);
}

#[test]
fn test_malformed_config_file() {
    let guard = tempdir().unwrap();
    let config = guard.path().join("bad.toml");
    fs::write(&config, "io_threads = [").unwrap();
    let dir = tempdir().unwrap();

    let (result, _) = run(cli(&config, &["-q", dir.path().to_str().unwrap()]));
    assert_eq!(error_code(result), ExitCode::ConfigError);
}

#[test]
fn test_missing_config_file() {
    let guard = tempdir().unwrap();
    let config = guard.path().join("typo.toml");
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();
    fs::write(dir.path().join("b"), "same").unwrap();

    let (result, _) = run(cli(&config, &["-q", dir.path().to_str().unwrap()]));
    assert_eq!(error_code(result), ExitCode::ConfigError);
    assert!(!fs::symlink_metadata(dir.path().join("b"))
        .unwrap()
        .file_type()
        .is_symlink());
}

#[test]
fn test_nonexistent_directory() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let (result, _) = run(cli(&config, &["-q", missing.to_str().unwrap()]));
    let err = result.unwrap_err();
    assert_eq!(ExitCode::classify(&err), ExitCode::DirectoryInaccessible);
    // Context is kept in the rendered chain
    assert!(format!("{err:#}").contains("failed to deduplicate"));
}

#[test]
fn test_print_config() {
    let guard = tempdir().unwrap();
    let config = guard.path().join("linkdupe.toml");
    fs::write(&config, "cleanup_retries = 5\n").unwrap();

    let (result, out) = run(cli(&config, &["--print-config", "--io-threads", "3"]));
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.contains("io_threads = 3"));
    assert!(out.contains("cleanup_retries = 5"));
}

#[test]
fn test_empty_directory_is_nothing_to_do() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();

    let (result, out) = run(cli(&config, &[dir.path().to_str().unwrap()]));
    assert_eq!(result.unwrap(), ExitCode::NothingToDo);
    assert!(out.starts_with("No files to deduplicate"));
}

#[test]
fn test_quiet_text_prints_nothing() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("solo"), b"x").unwrap();

    let (result, out) = run(cli(&config, &["-q", dir.path().to_str().unwrap()]));
    assert_eq!(result.unwrap(), ExitCode::NothingToDo);
    assert!(out.is_empty());
}

#[test]
#[cfg(unix)]
fn test_json_summary_after_dedupe() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let (result, out) = run(cli(
        &config,
        &["--output", "json", dir.path().to_str().unwrap()],
    ));
    assert_eq!(result.unwrap(), ExitCode::Success);

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["outcome"], "deduplicated");
    assert_eq!(value["links"][0]["target"], "a");
    assert_eq!(value["summary"]["duplicates_replaced"], 1);
    assert_eq!(value["summary"]["exit_code_name"], "LD000");
    assert_eq!(fs::read_link(dir.path().join("b")).unwrap(), PathBuf::from("a"));
}

#[test]
fn test_dry_run_text() {
    let (_guard, config) = config_file();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let (result, out) = run(cli(&config, &["-n", dir.path().to_str().unwrap()]));
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.contains("would link"));
    assert!(fs::symlink_metadata(dir.path().join("b")).unwrap().is_file());
}
