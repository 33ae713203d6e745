//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::ReplaceError;
use crate::config::ConfigError;
use crate::dedupe::DedupeError;
use crate::platform::PlatformError;

/// Exit codes for the linkdupe application.
///
/// - 0: Success (duplicates replaced, or planned in a dry run)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to do (no files, or no duplicates)
/// - 3: Partial success (links in place, some staging files left behind)
/// - 64: Configuration error (missing target directory, invalid config)
/// - 65: Unsupported platform (no symbolic links)
/// - 66: Target directory inaccessible
/// - 70: Unrecoverable filesystem state, operator intervention required
/// - 74: Filesystem failure, directory left consistent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were replaced with links.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// Nothing to do: the directory had no files or no duplicates.
    NothingToDo = 2,
    /// Partial success: all links created, some staging files not removed.
    PartialSuccess = 3,
    /// Configuration error: bad arguments or config file.
    ConfigError = 64,
    /// The host cannot create symbolic links.
    UnsupportedPlatform = 65,
    /// The target directory could not be listed.
    DirectoryInaccessible = 66,
    /// A link failed and its rollback failed as well.
    Unrecoverable = 70,
    /// Reading, staging or linking failed; nothing was left half-done.
    FilesystemError = 74,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LD000",
            Self::GeneralError => "LD001",
            Self::NothingToDo => "LD002",
            Self::PartialSuccess => "LD003",
            Self::ConfigError => "LD064",
            Self::UnsupportedPlatform => "LD065",
            Self::DirectoryInaccessible => "LD066",
            Self::Unrecoverable => "LD070",
            Self::FilesystemError => "LD074",
        }
    }

    /// Classify an application error into its exit code.
    ///
    /// Walks the error chain so that context added with `anyhow` does not
    /// hide the underlying failure class.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.is::<ConfigError>() {
                return Self::ConfigError;
            }
            if cause.is::<PlatformError>() {
                return Self::UnsupportedPlatform;
            }
            if let Some(dedupe) = cause.downcast_ref::<DedupeError>() {
                return match dedupe {
                    DedupeError::Scan(_) => Self::DirectoryInaccessible,
                    DedupeError::Read(_) => Self::FilesystemError,
                    DedupeError::Replace { source, .. } => Self::from_replace_error(source),
                    DedupeError::ThreadPool(_) => Self::GeneralError,
                };
            }
            if let Some(replace) = cause.downcast_ref::<ReplaceError>() {
                return Self::from_replace_error(replace);
            }
        }
        Self::GeneralError
    }

    fn from_replace_error(err: &ReplaceError) -> Self {
        if err.is_unrecoverable() {
            Self::Unrecoverable
        } else {
            Self::FilesystemError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LD066")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the directory needs manual repair
    pub unrecoverable: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            unrecoverable: exit_code == ExitCode::Unrecoverable,
        }
    }
}
