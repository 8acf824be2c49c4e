//! Fetch error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from acquiring dependencies.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The import path could not be mapped to a repository.
    #[error("resolving {import_path}: {source}")]
    Resolve {
        /// The dependency's import path.
        import_path: String,
        /// The resolver failure.
        #[source]
        source: stowage_resolver::ResolverError,
    },

    /// The VCS driver failed while fetching.
    #[error("fetching {import_path}: {source}")]
    Vcs {
        /// The dependency's import path.
        import_path: String,
        /// The driver failure.
        #[source]
        source: stowage_vcs::VcsError,
    },

    /// A repository-URL override could not be parsed.
    #[error("invalid repository url {url:?}: {message}")]
    OverrideUrl {
        /// The override URL.
        url: String,
        /// What is wrong with it.
        message: String,
    },

    /// No VCS could be detected for a repository-URL override.
    #[error("unable to detect version control system for {url:?}")]
    OverrideVcs {
        /// The override URL.
        url: String,
    },

    /// Filesystem trouble preparing or cleaning a working copy.
    #[error("io error at {path}: {message}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The worker pool could not be built.
    #[error("building fetch pool: {message}")]
    Pool {
        /// Underlying error text.
        message: String,
    },

    /// Several dependencies failed; all reports, concatenated.
    #[error("errors on fetch:\n{}", reports.join("\n"))]
    Aggregate {
        /// One rendered report per failed dependency.
        reports: Vec<String>,
    },
}

impl FetchError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
