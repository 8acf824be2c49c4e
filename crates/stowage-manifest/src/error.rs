//! Manifest error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or validating the manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A line with the wrong number of fields or a scheme-less URL.
    #[error("invalid config format: {line}")]
    Syntax {
        /// The offending line, comments stripped.
        line: String,
    },

    /// Filesystem trouble around the manifest.
    #[error("io error at {path}: {message}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Duplicate roots or subpackage declarations; a corrected manifest has
    /// been written next to the original.
    #[error("invalid config, please check warnings; suggested config in {suggested}")]
    Validation {
        /// Path of the suggested corrected manifest.
        suggested: PathBuf,
    },

    /// An entry's import root could not be resolved during validation.
    #[error("resolving root of {path:?}: {source}")]
    RootResolution {
        /// The entry's import path.
        path: String,
        /// The resolver failure.
        #[source]
        source: stowage_resolver::ResolverError,
    },
}

impl ManifestError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;
