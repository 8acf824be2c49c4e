//! Pruner error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from cleaning the vendor tree.
#[derive(Error, Debug)]
pub enum PruneError {
    /// A whitelist entry is not a valid regular expression.
    #[error("invalid whitelist pattern {pattern:?}: {message}")]
    BadPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex engine's complaint.
        message: String,
    },

    /// Filesystem trouble while walking or deleting.
    #[error("io error at {path}: {message}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl PruneError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for pruner operations.
pub type Result<T> = std::result::Result<T, PruneError>;
