//! The two-pass vendor cleaner.

use crate::error::{PruneError, Result};
use crate::rules::{VENDOR_CONFIG_FILES, is_interesting_dir, is_license_file, is_source_file};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use stowage_gopkg::Package;
use tracing::debug;
use walkdir::WalkDir;

/// Anchored patterns naming vendor-relative paths pruning must not touch.
#[derive(Debug, Default)]
pub struct Whitelist {
    patterns: Vec<Regex>,
}

impl Whitelist {
    /// Compile patterns; each is matched anchored against the whole
    /// vendor-relative path.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let anchored = format!("^(?:{pattern})$");
            compiled.push(Regex::new(&anchored).map_err(|err| PruneError::BadPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?);
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether any pattern matches the vendor-relative path.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(relative))
    }

    /// Whether no patterns were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// What pruning keeps: the directories of needed packages and, per
/// directory, the files the loader excluded under the build configuration.
#[derive(Debug, Default)]
pub struct KeepSet {
    dirs: HashSet<PathBuf>,
    ignored_files: HashSet<PathBuf>,
}

impl KeepSet {
    /// Build from a resolved package set. Standard-library stubs carry no
    /// directory and are skipped.
    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a Package>) -> Self {
        let mut keep = Self::default();
        for pkg in packages {
            if pkg.dir.as_os_str().is_empty() {
                continue;
            }
            keep.dirs.insert(pkg.dir.clone());
            for name in &pkg.ignored_go_files {
                keep.ignored_files.insert(pkg.dir.join(name));
            }
        }
        keep
    }

    /// Whether any needed package lives under `dir` (inclusive).
    #[must_use]
    pub fn any_under(&self, dir: &Path) -> bool {
        self.dirs.iter().any(|kept| kept.starts_with(dir))
    }
}

fn vendor_relative(vendor_dir: &Path, path: &Path) -> String {
    path.strip_prefix(vendor_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}

/// Remove everything under `vendor_dir` that the keep set, the retention
/// rules and the whitelist do not claim. Running it twice deletes nothing
/// on the second pass.
pub fn clean_vendor(vendor_dir: &Path, keep: &KeepSet, whitelist: &Whitelist) -> Result<()> {
    let mut keep_dirs = keep.dirs.clone();
    let mut non_keep_dirs: Vec<PathBuf> = Vec::new();

    // File pass: delete what cannot stay, record candidate directories.
    let mut it = WalkDir::new(vendor_dir).sort_by_file_name().into_iter();
    while let Some(entry) = it.next() {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path == vendor_dir {
            continue;
        }
        let relative = vendor_relative(vendor_dir, path);
        if whitelist.matches(&relative) {
            if entry.file_type().is_dir() {
                it.skip_current_dir();
            }
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            debug!(path = %path.display(), "removing hidden entry");
            remove_any(path, entry.file_type().is_dir())?;
            if entry.file_type().is_dir() {
                it.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_dir() {
            if name == "testdata" {
                debug!(path = %path.display(), "removing testdata");
                fs::remove_dir_all(path).map_err(|err| PruneError::io(path, &err))?;
                it.skip_current_dir();
                continue;
            }
            if is_interesting_dir(path) {
                keep_dirs.insert(path.to_path_buf());
                continue;
            }
            if !keep_dirs.contains(path) {
                non_keep_dirs.push(path.to_path_buf());
            }
            continue;
        }

        // Licensing and nested vendor configuration always survive.
        if is_license_file(&name) || VENDOR_CONFIG_FILES.contains(&name.as_str()) {
            continue;
        }

        let parent_kept = path.parent().is_some_and(|parent| keep_dirs.contains(parent));
        if !parent_kept
            || !is_source_file(&name)
            || name.ends_with("_test.go")
            || keep.ignored_files.contains(path)
        {
            fs::remove_file(path).map_err(|err| PruneError::io(path, &err))?;
        }
    }

    // Directory pass, deepest paths first: collapse directories whose only
    // remaining direct entries are non-source files the whitelist does not
    // claim. Empty directories qualify vacuously.
    non_keep_dirs.sort_by(|a, b| b.as_os_str().len().cmp(&a.as_os_str().len()));
    for dir in non_keep_dirs {
        if !dir.exists() {
            continue;
        }
        let entries = fs::read_dir(&dir).map_err(|err| PruneError::io(&dir, &err))?;
        let mut removable = true;
        for entry in entries {
            let entry = entry.map_err(|err| PruneError::io(&dir, &err))?;
            if entry.file_type().map_err(|err| PruneError::io(&dir, &err))?.is_dir() {
                removable = false;
                break;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = vendor_relative(vendor_dir, &entry.path());
            if is_source_file(&name) || whitelist.matches(&relative) {
                removable = false;
                break;
            }
        }
        if removable {
            debug!(path = %dir.display(), "collapsing residue directory");
            fs::remove_dir_all(&dir).map_err(|err| PruneError::io(&dir, &err))?;
        }
    }
    Ok(())
}

/// Manifest import paths with no needed package anywhere under their
/// vendor subtree. Each deserves an "unused" warning.
#[must_use]
pub fn unused_entries<'a>(
    vendor_dir: &Path,
    keep: &KeepSet,
    import_paths: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    import_paths
        .into_iter()
        .filter(|import_path| {
            let subtree: PathBuf = import_path
                .split('/')
                .fold(vendor_dir.to_path_buf(), |acc, part| acc.join(part));
            !keep.any_under(&subtree)
        })
        .map(str::to_string)
        .collect()
}

fn remove_any(path: &Path, is_dir: bool) -> Result<()> {
    let removed = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|err| PruneError::io(path, &err))
}
