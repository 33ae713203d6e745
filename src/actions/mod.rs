//! Filesystem mutations.
//!
//! The only action is replacing a duplicate with a relative symbolic link
//! to its canonical copy. Each replacement goes through three steps:
//!
//! - **stage**: rename the duplicate to a hidden staging name
//! - **link**: create the link at the duplicate's original name
//! - **cleanup**: remove the staged file
//!
//! A failed link is rolled back by renaming the staged file back.
//!
//! ```no_run
//! use linkdupe::actions::Replacer;
//! use std::ffi::OsStr;
//! use std::path::Path;
//!
//! let replacer = Replacer::default();
//! let replacement = replacer
//!     .replace(Path::new("/photos"), OsStr::new("a.jpg"), OsStr::new("b.jpg"))
//!     .unwrap();
//! assert!(replacement.cleanup_warning.is_none());
//! ```

pub mod replace;

// Re-export commonly used types
pub use replace::{
    is_staging_name, CleanupWarning, LinkFs, ReplaceError, ReplaceState, Replacement, Replacer,
    StdFs,
};
