//! VCS error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from driving a version-control binary.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The VCS binary is absent from the executable search path.
    #[error("{vcs} is not installed or not in PATH")]
    ToolMissing {
        /// Human-readable system name (e.g. "Mercurial").
        vcs: &'static str,
    },

    /// The binary ran but exited non-zero.
    #[error("command `{command}` failed: {output}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Captured stdout+stderr, trimmed.
        output: String,
        /// Exit code if the process was not killed by a signal.
        exit_code: Option<i32>,
    },

    /// Filesystem trouble around a working copy.
    #[error("io error at {path}: {message}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Output of a query command could not be interpreted.
    #[error("unable to parse output of {vcs} {command}")]
    OutputParse {
        /// Human-readable system name.
        vcs: &'static str,
        /// The query that produced the output.
        command: &'static str,
    },

    /// A kind name outside {git, hg, svn, bzr}.
    #[error("unknown version control system {name:?}")]
    UnknownKind {
        /// The offending name.
        name: String,
    },
}

impl VcsError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for VCS operations.
pub type Result<T> = std::result::Result<T, VcsError>;
