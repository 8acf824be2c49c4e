//! Manifest record types.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// One pinned dependency: an import path, an opaque revision the VCS
/// understands, and an optional fetch-URL override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Logical package root, e.g. `example.org/x/net`.
    pub import_path: String,
    /// Commit hash, tag or branch.
    pub revision: String,
    /// Override fetch URL, scheme included.
    pub repo_url: Option<String>,
}

impl Dependency {
    /// Create an entry without a URL override.
    #[must_use]
    pub fn new(import_path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            revision: revision.into(),
            repo_url: None,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repo_url {
            Some(url) => write!(f, "{} {} {}", self.import_path, self.revision, url),
            None => write!(f, "{} {}", self.import_path, self.revision),
        }
    }
}

static VERSIONED: Lazy<Regex> = Lazy::new(|| Regex::new(r"/v[0-9]+$").unwrap());

/// Whether an import path ends in a major-version element like
/// `example.org/x/foo/v22`. Such paths are legitimate subdirectory imports
/// and must not be rewritten to their repository root.
#[must_use]
pub fn is_versioned(import_path: &str) -> bool {
    VERSIONED.is_match(import_path)
}
