//! Resolver error types.

use thiserror::Error;

/// Errors from mapping an import path to a repository root.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The import path itself is malformed for the matched site.
    #[error("invalid import path {path:?}: {reason}")]
    InvalidImportPath {
        /// The offending path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No static rule and no meta tag could place the path.
    #[error("unrecognized import path {path:?} ({source})")]
    UnknownSite {
        /// The offending path.
        path: String,
        /// The dynamic-discovery failure that ended the search.
        #[source]
        source: Box<ResolverError>,
    },

    /// The import path has no host component.
    #[error("import path {path:?} does not begin with hostname")]
    NoHost {
        /// The offending path.
        path: String,
    },

    /// More than one `go-import` meta tag matched the path.
    #[error("parse {url}: multiple meta tags match import path {path:?}")]
    Ambiguous {
        /// Discovery URL that served the tags.
        url: String,
        /// The import path being resolved.
        path: String,
    },

    /// The page served no matching `go-import` meta tag.
    #[error("parse {url}: no go-import meta tags")]
    NoMetaTag {
        /// Discovery URL.
        url: String,
    },

    /// A shorter-prefix verification fetch disagreed with the first answer.
    #[error("{first_url} and {second_url} disagree about go-import for {prefix:?}")]
    DiscoveryMismatch {
        /// URL of the original discovery.
        first_url: String,
        /// URL of the verification discovery.
        second_url: String,
        /// The disputed prefix.
        prefix: String,
    },

    /// A meta tag declared a repository root without a scheme.
    #[error("{url}: invalid repo root {repo_root:?}; no scheme")]
    NoScheme {
        /// Discovery URL.
        url: String,
        /// The declared repository root.
        repo_root: String,
    },

    /// The computed import root contains a `...` wildcard.
    #[error("cannot expand ... in {path:?}")]
    WildcardRoot {
        /// The offending path.
        path: String,
    },

    /// Repository name carries a VCS suffix on a site that forbids it.
    #[error("invalid version control suffix in {site} path")]
    VcsSuffix {
        /// Site prefix, e.g. `github.com/`.
        site: String,
    },

    /// A rule or meta tag named a VCS outside {git, hg, svn, bzr}.
    #[error("unknown version control system {name:?} for {subject}")]
    UnknownVcs {
        /// The unknown name.
        name: String,
        /// What named it (a URL or import path).
        subject: String,
    },

    /// A site-specific check could not determine the VCS.
    #[error("unable to detect version control system for {site} path")]
    VcsDetection {
        /// Site prefix.
        site: String,
    },

    /// Network failure or unexpected status during discovery.
    #[error("{url}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// Failure description (error or HTTP status line).
        message: String,
        /// HTTP status when a response arrived.
        status: Option<u16>,
    },

    /// A memoized discovery failure, replayed from the prefix cache.
    #[error("{message}")]
    Discovery {
        /// Discovery URL (may be empty when the request never went out).
        url: String,
        /// The memoized failure text.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("building http client: {message}")]
    ClientBuild {
        /// Underlying error text.
        message: String,
    },
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
