//! linkdupe - collapse duplicate files into symbolic links
//!
//! Every regular file directly inside a directory is fingerprinted with
//! BLAKE3. Files with equal content form an equivalence class; the file
//! with the smallest name is kept and every other member is replaced by a
//! relative symbolic link to it.
//!
//! Replacement is transactional per file (stage, link, cleanup) and the
//! whole directory is read before anything is modified.

pub mod actions;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod platform;
pub mod progress;
pub mod scanner;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::{Config, ConfigError};
use crate::dedupe::{DedupeConfig, Deduplicator, RunOutcome, RunSummary};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the application, writing the summary to stdout.
///
/// # Errors
///
/// Returns an error for every fatal failure; classify it with
/// [`ExitCode::classify`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_app_to(cli, &mut out)
}

/// Run the application, writing the summary to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_to<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    platform::check_symlink_support()?;

    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_cli(&cli);
    config.validate()?;
    log::debug!("Effective config: {:?}", config);

    if cli.print_config {
        out.write_all(config.to_toml()?.as_bytes())
            .context("failed to write configuration")?;
        return Ok(ExitCode::Success);
    }

    let dir = cli.path.as_deref().ok_or(ConfigError::MissingDirectory)?;
    if dir.as_os_str().is_empty() {
        return Err(ConfigError::EmptyDirectory.into());
    }

    let mut dedupe_config = DedupeConfig::from_config(&config).with_dry_run(cli.dry_run);
    let show_progress = !cli.quiet && cli.output == OutputFormat::Text;
    if show_progress {
        dedupe_config = dedupe_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let summary = Deduplicator::new(dedupe_config)
        .run(dir)
        .with_context(|| format!("failed to deduplicate {}", dir.display()))?;

    let code = exit_code_for(&summary);
    match cli.output {
        OutputFormat::Json => JsonOutput::new(&summary, code)
            .write_to(out, true)
            .context("failed to write JSON summary")?,
        OutputFormat::Text if !cli.quiet => TextOutput::new(&summary)
            .write_to(out)
            .context("failed to write summary")?,
        OutputFormat::Text => {}
    }

    Ok(code)
}

/// Exit code for a run that completed.
#[must_use]
pub fn exit_code_for(summary: &RunSummary) -> ExitCode {
    match summary.outcome {
        RunOutcome::NoFiles | RunOutcome::NoDuplicates => ExitCode::NothingToDo,
        RunOutcome::Deduplicated if summary.has_warnings() => ExitCode::PartialSuccess,
        RunOutcome::Deduplicated | RunOutcome::DryRun => ExitCode::Success,
    }
}
