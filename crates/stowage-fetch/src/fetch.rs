//! Fetching one dependency into the vendor tree.

use crate::cleanup::scrub_working_copy;
use crate::error::{FetchError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use stowage_manifest::Dependency;
use stowage_resolver::{Resolver, SecurityMode};
use stowage_vcs::{Driver, VcsKind};
use tracing::debug;
use url::Url;

/// A freshly fetched repository on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    /// Import path of the repository root.
    pub import_root: String,
    /// Where it landed: `<vendor>/<import root>`.
    pub dir: PathBuf,
    /// Which system fetched it.
    pub kind: VcsKind,
}

/// Fetch the repository behind `import_path` into the vendor tree, checked
/// out at `revision` when one is given, at the default branch head
/// otherwise. The target directory is erased first; VCS metadata is left in
/// place so the caller can still query the working copy.
pub fn fetch_repo(
    vendor_dir: &Path,
    import_path: &str,
    revision: Option<&str>,
    repo_url: Option<&str>,
    resolver: &Resolver,
    security: SecurityMode,
) -> Result<WorkingCopy> {
    let (kind, repo, root) = match repo_url {
        Some(url) => {
            let kind = detect_override_vcs(resolver, url)?;
            // The override bypasses resolution entirely: the declared
            // import path is the root and the URL is fetched verbatim.
            (kind, url.to_string(), import_path.to_string())
        }
        None => {
            let resolved =
                resolver
                    .resolve(import_path, security)
                    .map_err(|source| FetchError::Resolve {
                        import_path: import_path.to_string(),
                        source,
                    })?;
            (resolved.kind, resolved.repo, resolved.root)
        }
    };

    let dest: PathBuf = root
        .split('/')
        .fold(vendor_dir.to_path_buf(), |acc, part| acc.join(part));
    if dest.exists() {
        fs::remove_dir_all(&dest).map_err(|err| FetchError::io(&dest, &err))?;
    }
    // Some version control tools require the parent of the target to exist.
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|err| FetchError::io(parent, &err))?;
    }

    debug!(import_path, repo = %repo, vcs = %kind, dest = %dest.display(), "fetch");
    let driver = Driver::new(kind);
    let fetched = match revision {
        Some(revision) if !revision.is_empty() => {
            driver.create_at_revision(&dest, &repo, revision)
        }
        _ => driver.create(&dest, &repo),
    };
    fetched.map_err(|source| FetchError::Vcs {
        import_path: import_path.to_string(),
        source,
    })?;

    Ok(WorkingCopy {
        import_root: root,
        dir: dest,
        kind,
    })
}

/// Fetch one manifest entry and strip the working copy of its VCS metadata
/// and nested vendor trees.
pub fn fetch_dependency(
    vendor_dir: &Path,
    dep: &Dependency,
    resolver: &Resolver,
    security: SecurityMode,
) -> Result<WorkingCopy> {
    let copy = fetch_repo(
        vendor_dir,
        &dep.import_path,
        Some(&dep.revision),
        dep.repo_url.as_deref(),
        resolver,
        security,
    )?;
    scrub_working_copy(&copy)?;
    Ok(copy)
}

/// Determine the VCS for a repository-URL override: user-info is dropped,
/// a `.git` suffix is stripped, and the remaining host+path goes through
/// the static-rule detector. The suffix itself is the fallback hint when
/// the stripped form matches nothing.
fn detect_override_vcs(resolver: &Resolver, repo_url: &str) -> Result<VcsKind> {
    let parsed = Url::parse(repo_url).map_err(|err| FetchError::OverrideUrl {
        url: repo_url.to_string(),
        message: err.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| FetchError::OverrideUrl {
        url: repo_url.to_string(),
        message: "no host".to_string(),
    })?;
    let host_and_path = format!("{host}{}", parsed.path());
    let stripped = host_and_path
        .strip_suffix(".git")
        .unwrap_or(&host_and_path);

    resolver
        .detect_vcs(stripped)
        .or_else(|| resolver.detect_vcs(&host_and_path))
        .ok_or_else(|| FetchError::OverrideVcs {
            url: repo_url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> Resolver {
        Resolver::new().unwrap()
    }

    #[test]
    fn override_detection_strips_suffix_and_userinfo() {
        let r = resolver();
        assert_eq!(
            detect_override_vcs(&r, "https://git@github.com/user/repo.git").unwrap(),
            VcsKind::Git
        );
        assert_eq!(
            detect_override_vcs(&r, "https://example.org/team/repo.hg").unwrap(),
            VcsKind::Hg
        );
    }

    #[test]
    fn override_detection_fails_for_unknown_hosts() {
        let err = detect_override_vcs(&resolver(), "https://example.org/team/repo").unwrap_err();
        assert!(matches!(err, FetchError::OverrideVcs { .. }));
    }

    #[test]
    fn override_url_must_parse() {
        let err = detect_override_vcs(&resolver(), "not a url").unwrap_err();
        assert!(matches!(err, FetchError::OverrideUrl { .. }));
    }
}
