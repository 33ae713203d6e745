//! Host capability check.
//!
//! linkdupe only runs where POSIX-style symbolic links exist. The check runs
//! once at startup, before the target directory is touched.

use thiserror::Error;

/// The host cannot run linkdupe.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The operating system has no POSIX-style symbolic links.
    #[error("symbolic links are not supported on this platform ({os})")]
    SymlinksUnsupported {
        /// `std::env::consts::OS` of the host
        os: &'static str,
    },
}

/// Whether the current build target supports POSIX symbolic links.
#[must_use]
pub const fn symlinks_supported() -> bool {
    cfg!(unix)
}

/// Verify that the host can create symbolic links.
///
/// # Errors
///
/// Returns [`PlatformError::SymlinksUnsupported`] on non-Unix hosts.
pub fn check_symlink_support() -> Result<(), PlatformError> {
    if symlinks_supported() {
        log::trace!("Platform check passed ({})", std::env::consts::OS);
        Ok(())
    } else {
        Err(PlatformError::SymlinksUnsupported {
            os: std::env::consts::OS,
        })
    }
}
