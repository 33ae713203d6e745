//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML config file (`--config PATH`, or `linkdupe.toml` in the
//!    platform config directory)
//! 3. `LINKDUPE_*` environment variables (e.g. `LINKDUPE_IO_THREADS=8`)
//! 4. CLI flags ([`Config::merge_cli`])

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::replace::DEFAULT_CLEANUP_RETRIES;
use crate::cli::Cli;
use crate::duplicates::DEFAULT_IO_THREADS;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LINKDUPE_";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "linkdupe.toml";

/// Configuration problems. All of them stop the program before the target
/// directory is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No target directory was given.
    #[error("no target directory given")]
    MissingDirectory,

    /// The target directory argument was an empty string.
    #[error("target directory must not be empty")]
    EmptyDirectory,

    /// An explicitly named config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The config layers could not be merged or parsed.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// A value is outside its allowed range.
    #[error("invalid value for {key}: {message}")]
    OutOfRange {
        /// Config key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The config could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of threads used for fingerprinting.
    pub io_threads: usize,
    /// Extra attempts to remove a staging file after the first failure.
    pub cleanup_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            cleanup_retries: DEFAULT_CLEANUP_RETRIES,
        }
    }
}

impl Config {
    /// Build the figment for the given config file (or the default path).
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match config_file.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => {
                log::debug!("Config file: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => log::debug!("No platform config directory; skipping config file"),
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, config file and environment.
    ///
    /// A missing file at the platform default path is skipped. A missing
    /// file that was named explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `config_file` is not a file,
    /// [`ConfigError::Invalid`] if a layer cannot be parsed, or
    /// [`ConfigError::OutOfRange`] if a value is invalid.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        let config: Config = Self::figment(config_file).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of the loaded layers.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a zero thread count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::OutOfRange {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "linkdupe", "linkdupe")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
