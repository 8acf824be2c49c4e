//! Core VCS types.

use std::fmt;
use std::path::Path;

/// Supported version-control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsKind {
    /// Git.
    Git,
    /// Mercurial.
    Hg,
    /// Subversion.
    Svn,
    /// Bazaar.
    Bzr,
}

/// All supported kinds, in ping-preference order.
pub const ALL_KINDS: [VcsKind; 4] = [VcsKind::Git, VcsKind::Hg, VcsKind::Svn, VcsKind::Bzr];

impl VcsKind {
    /// Name of the binary to invoke.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
            Self::Bzr => "bzr",
        }
    }

    /// Human-readable system name, used in error messages.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Git => "Git",
            Self::Hg => "Mercurial",
            Self::Svn => "Subversion",
            Self::Bzr => "Bazaar",
        }
    }

    /// Name of the metadata directory a working copy carries.
    #[must_use]
    pub const fn metadata_dir(&self) -> &'static str {
        match self {
            Self::Git => ".git",
            Self::Hg => ".hg",
            Self::Svn => ".svn",
            Self::Bzr => ".bzr",
        }
    }

    /// Look up a kind by its command name.
    #[must_use]
    pub fn from_command(cmd: &str) -> Option<Self> {
        ALL_KINDS.into_iter().find(|kind| kind.command() == cmd)
    }

    /// Sniff the kind of an existing working copy by its metadata directory.
    #[must_use]
    pub fn detect_in(path: &Path) -> Option<Self> {
        ALL_KINDS
            .into_iter()
            .find(|kind| path.join(kind.metadata_dir()).is_dir())
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl std::str::FromStr for VcsKind {
    type Err = crate::error::VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_command(s).ok_or_else(|| crate::error::VcsError::UnknownKind {
            name: s.to_string(),
        })
    }
}

/// Whether a URL scheme is considered secure for fetching.
#[must_use]
pub fn is_secure_scheme(scheme: &str) -> bool {
    matches!(scheme, "https" | "ssh" | "git+ssh" | "bzr+ssh" | "svn+ssh")
}
