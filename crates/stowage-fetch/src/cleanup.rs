//! Post-fetch scrubbing of working copies.

use crate::error::{FetchError, Result};
use crate::fetch::WorkingCopy;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Directory names that mark a dependency's own vendored code.
const NESTED_VENDOR_DIRS: [&str; 3] = ["vendor", "Godeps", "_vendor"];

/// Remove the VCS metadata directory and every nested vendor tree from a
/// fresh working copy.
pub fn scrub_working_copy(copy: &WorkingCopy) -> Result<()> {
    let metadata = copy.dir.join(copy.kind.metadata_dir());
    if metadata.exists() {
        fs::remove_dir_all(&metadata).map_err(|err| FetchError::io(&metadata, &err))?;
    }
    strip_nested_vendor(&copy.dir)
}

/// Delete every directory named `vendor`, `Godeps` or `_vendor` below
/// `root`, without descending into them.
pub(crate) fn strip_nested_vendor(root: &Path) -> Result<()> {
    let mut it = WalkDir::new(root).into_iter();
    while let Some(entry) = it.next() {
        let entry = entry.map_err(|err| FetchError::Io {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_dir() || entry.path() == root {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if NESTED_VENDOR_DIRS.contains(&name.as_ref()) {
            debug!(path = %entry.path().display(), "removing nested vendor dir");
            fs::remove_dir_all(entry.path())
                .map_err(|err| FetchError::io(entry.path(), &err))?;
            it.skip_current_dir();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_vcs::VcsKind;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn scrub_removes_metadata_and_nested_vendor() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("example.org/dep");
        touch(&root, ".git/HEAD");
        touch(&root, "lib.go");
        touch(&root, "vendor/other.example.org/x/x.go");
        touch(&root, "sub/Godeps/Godeps.json");
        touch(&root, "sub/_vendor/y/y.go");
        touch(&root, "sub/kept.go");

        let copy = WorkingCopy {
            import_root: "example.org/dep".to_string(),
            dir: root.clone(),
            kind: VcsKind::Git,
        };
        scrub_working_copy(&copy).unwrap();

        assert!(!root.join(".git").exists());
        assert!(!root.join("vendor").exists());
        assert!(!root.join("sub/Godeps").exists());
        assert!(!root.join("sub/_vendor").exists());
        assert!(root.join("lib.go").exists());
        assert!(root.join("sub/kept.go").exists());
    }

    #[test]
    fn scrub_tolerates_missing_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("example.org/dep");
        touch(&root, "lib.go");

        let copy = WorkingCopy {
            import_root: "example.org/dep".to_string(),
            dir: root,
            kind: VcsKind::Hg,
        };
        scrub_working_copy(&copy).unwrap();
    }
}
