//! Loader error types.

use crate::package::Package;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading packages and resolving imports.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The directory holds no buildable Go source; not a package.
    #[error("no buildable Go source files in {dir}")]
    NoGoFiles {
        /// The directory.
        dir: PathBuf,
    },

    /// Files in the directory disagree about the package name. The package
    /// descriptor is still produced and carried inside the error so callers
    /// that only need the import lists can recover it.
    #[error("found packages {names:?} in {dir}")]
    MultiplePackages {
        /// The directory.
        dir: PathBuf,
        /// The distinct package names found.
        names: Vec<String>,
        /// The usable descriptor, imports included.
        package: Box<Package>,
    },

    /// The import path resolves to nothing under vendor or the source root.
    #[error("cannot find package {import_path:?}")]
    CannotFind {
        /// The import path.
        import_path: String,
    },

    /// An on-the-fly download of a missing dependency failed.
    #[error("fetching {import_path}: {message}")]
    Fetch {
        /// The import path being materialized.
        import_path: String,
        /// The downloader's failure text.
        message: String,
    },

    /// Filesystem trouble while scanning sources.
    #[error("io error at {path}: {message}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl LoadError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Treat a multiple-packages load as a success, yielding the recovered
/// descriptor; every other error stays an error.
pub fn recover_multiple(result: Result<Package>) -> Result<Package> {
    match result {
        Err(LoadError::MultiplePackages { package, .. }) => Ok(*package),
        other => other,
    }
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
