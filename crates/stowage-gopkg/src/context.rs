//! The build context: everything file selection depends on.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Operating systems the filename-gating rules recognize.
pub(crate) const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "illumos", "ios", "js", "linux", "netbsd",
    "openbsd", "plan9", "solaris", "windows",
];

/// Architectures the filename-gating rules recognize.
pub(crate) const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mips64", "mips64le", "mipsle", "ppc64",
    "ppc64le", "riscv64", "s390x", "wasm",
];

fn host_goos() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

fn host_goarch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "x86" => "386".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Parameters for loading packages: target platform, cgo, tag handling and
/// the source root imports resolve under.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Target operating system (`linux`, `darwin`, ...).
    pub goos: String,
    /// Target architecture (`amd64`, `arm64`, ...).
    pub goarch: String,
    /// Whether cgo-gated files count as buildable.
    pub cgo_enabled: bool,
    /// Include every parseable file's imports regardless of tag gating.
    /// Gated files are still reported in `ignored_go_files`.
    pub use_all_files: bool,
    /// Tags forced false during constraint evaluation.
    pub ignore_tags: HashSet<String>,
    /// The source root: imports resolve under `<gopath>/src`.
    pub gopath: PathBuf,
}

impl BuildContext {
    /// Context for the host platform with the conservative defaults this
    /// tool wants: cgo on, all files included.
    #[must_use]
    pub fn new(gopath: impl Into<PathBuf>) -> Self {
        Self {
            goos: host_goos(),
            goarch: host_goarch(),
            cgo_enabled: true,
            use_all_files: true,
            ignore_tags: HashSet::new(),
            gopath: gopath.into(),
        }
    }

    /// The directory project and dependency sources live under.
    #[must_use]
    pub fn src_root(&self) -> PathBuf {
        self.gopath.join("src")
    }

    /// Truth value of one build tag under this context.
    #[must_use]
    pub fn tag_set(&self, tag: &str) -> bool {
        if self.ignore_tags.contains(tag) {
            return false;
        }
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        if tag == "cgo" {
            return self.cgo_enabled;
        }
        // Release tags: every go1.x is satisfied.
        if tag == "gc" || tag.starts_with("go1.") {
            return true;
        }
        false
    }

    /// Whether `_GOOS`/`_GOARCH` filename gating admits `name` (a `.go`
    /// file name). A trailing `_test` element is stripped first; only the
    /// part after the first underscore participates, so a file named
    /// `linux.go` is never gated while `foo_linux.go` is.
    #[must_use]
    pub fn filename_included(&self, name: &str) -> bool {
        let base = name.strip_suffix(".go").unwrap_or(name);
        let base = base.strip_suffix("_test").unwrap_or(base);
        let Some(idx) = base.find('_') else {
            return true;
        };
        let parts: Vec<&str> = base[idx + 1..].split('_').collect();
        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                *os == self.goos && *arch == self.goarch
            }
            [.., last] if KNOWN_OS.contains(last) => *last == self.goos,
            [.., last] if KNOWN_ARCH.contains(last) => *last == self.goarch,
            _ => true,
        }
    }

    /// Whether `dir` sits inside this context's source root.
    #[must_use]
    pub fn under_src_root(&self, dir: &Path) -> bool {
        dir.starts_with(self.src_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn linux_amd64() -> BuildContext {
        let mut ctx = BuildContext::new("/go");
        ctx.goos = "linux".to_string();
        ctx.goarch = "amd64".to_string();
        ctx
    }

    #[test_case("file.go", true; "ungated")]
    #[test_case("file_linux.go", true; "matching os")]
    #[test_case("file_windows.go", false; "other os")]
    #[test_case("file_amd64.go", true; "matching arch")]
    #[test_case("file_arm64.go", false; "other arch")]
    #[test_case("file_linux_amd64.go", true; "matching pair")]
    #[test_case("file_linux_arm64.go", false; "pair with other arch")]
    #[test_case("file_windows_amd64.go", false; "pair with other os")]
    #[test_case("file_linux_test.go", true; "test suffix stripped before gating")]
    #[test_case("file_windows_test.go", false; "gated test file")]
    #[test_case("linux.go", true; "bare os name is not gating")]
    #[test_case("linux_amd64.go", true; "prefix before first underscore is ignored")]
    fn filename_gating(name: &str, included: bool) {
        assert_eq!(linux_amd64().filename_included(name), included);
    }

    #[test]
    fn tags_follow_context() {
        let mut ctx = linux_amd64();
        assert!(ctx.tag_set("linux"));
        assert!(ctx.tag_set("amd64"));
        assert!(ctx.tag_set("cgo"));
        assert!(ctx.tag_set("go1.18"));
        assert!(!ctx.tag_set("windows"));
        assert!(!ctx.tag_set("mytag"));

        ctx.ignore_tags.insert("cgo".to_string());
        assert!(!ctx.tag_set("cgo"));
    }

    #[test]
    fn src_root_is_gopath_src() {
        let ctx = BuildContext::new("/home/dev/go");
        assert_eq!(ctx.src_root(), PathBuf::from("/home/dev/go/src"));
        assert!(ctx.under_src_root(Path::new("/home/dev/go/src/example.org/x")));
        assert!(!ctx.under_src_root(Path::new("/tmp/elsewhere")));
    }
}
