//! Package descriptors.

use std::path::PathBuf;

/// What the loader knows about one directory of Go source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Logical import path.
    pub import_path: String,
    /// Directory the sources live in; empty for standard-library stubs.
    pub dir: PathBuf,
    /// Non-test files that participate in the package.
    pub go_files: Vec<String>,
    /// Files excluded by build constraints or filename gating.
    pub ignored_go_files: Vec<String>,
    /// Direct imports of the non-test files.
    pub imports: Vec<String>,
    /// Imports of in-package `_test.go` files.
    pub test_imports: Vec<String>,
    /// Imports of `package foo_test` files.
    pub xtest_imports: Vec<String>,
    /// Union of build tags seen across all files.
    pub all_tags: Vec<String>,
    /// Whether this is a standard-library package.
    pub in_std_lib: bool,
}

impl Package {
    /// Stub descriptor for a standard-library import.
    #[must_use]
    pub fn std_lib(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            in_std_lib: true,
            ..Self::default()
        }
    }
}

/// An import is in the standard library iff the first path element carries
/// no dot: `fmt`, `net/http`, `archive/tar` — but not `example.org/x`.
#[must_use]
pub fn is_std_lib_path(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    !first.contains('.')
}
