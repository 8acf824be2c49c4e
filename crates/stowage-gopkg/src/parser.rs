//! Line-oriented scanning of Go source files.
//!
//! Extracts exactly what the loader needs: the package clause, the import
//! declarations, and any build constraints above the package clause. This
//! is not a Go parser; declarations after the import section are never
//! inspected.

use crate::constraint::{Expr, parse_go_build, parse_plus_build};
use crate::context::BuildContext;
use crate::error::LoadError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Scan result for one `.go` file.
#[derive(Debug, Clone, Default)]
pub(crate) struct GoFile {
    pub name: String,
    pub package_name: String,
    pub imports: Vec<String>,
    /// `//go:build` expression, when present and well-formed.
    pub go_build: Option<Expr>,
    /// Legacy `// +build` lines; all must hold.
    pub plus_build: Vec<Expr>,
    /// A constraint line existed but did not parse; the file is excluded.
    pub malformed_constraint: bool,
    /// Tags mentioned by the constraints.
    pub tags: HashSet<String>,
}

impl GoFile {
    /// Whether this file is a test file by name.
    pub fn is_test(&self) -> bool {
        self.name.ends_with("_test.go")
    }

    /// Whether this is an external (`package foo_test`) test file.
    pub fn is_external_test(&self) -> bool {
        self.is_test() && self.package_name.ends_with("_test")
    }

    /// Evaluate the file's build constraints under `ctx`. The `//go:build`
    /// form wins over legacy lines when both are present.
    pub fn constraints_satisfied(&self, ctx: &BuildContext) -> bool {
        if self.malformed_constraint {
            return false;
        }
        let oracle = |tag: &str| ctx.tag_set(tag);
        if let Some(expr) = &self.go_build {
            return expr.eval(&oracle);
        }
        self.plus_build.iter().all(|expr| expr.eval(&oracle))
    }
}

/// Parse a `.go` file from disk. `Ok(None)` means the file carries no
/// package clause and should be skipped entirely.
pub(crate) fn parse_go_file(path: &Path) -> Result<Option<GoFile>, LoadError> {
    let source = fs::read_to_string(path).map_err(|err| LoadError::io(path, &err))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(parse_go_source(&name, &source))
}

/// Strip a `//` comment that sits outside string literals.
fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'\\' if in_string => i += 1,
            b'/' if !in_string && i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                return &line[..i];
            }
            _ => {}
        }
        i += 1;
    }
    line
}

/// Extract the first double-quoted string in a line.
fn quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let end = line[start..].find('"')? + start;
    Some(&line[start..end])
}

pub(crate) fn parse_go_source(name: &str, source: &str) -> Option<GoFile> {
    let mut file = GoFile {
        name: name.to_string(),
        ..GoFile::default()
    };

    let mut in_block_comment = false;
    let mut seen_package = false;
    let mut in_import_block = false;

    for raw in source.lines() {
        let mut line = raw.trim_start_matches('\u{feff}').trim();

        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        // Strip a block comment opened and closed on the same line; one that
        // stays open swallows the rest of the line.
        while let Some(start) = line.find("/*") {
            match line[start..].find("*/") {
                Some(end) => {
                    let before = &line[..start];
                    let after = &line[start + end + 2..];
                    // Only this simple concatenation case matters for the
                    // declarations we scan.
                    line = if before.trim().is_empty() {
                        after.trim()
                    } else {
                        before.trim_end()
                    };
                    if line.is_empty() {
                        break;
                    }
                }
                None => {
                    in_block_comment = true;
                    line = line[..start].trim_end();
                    break;
                }
            }
        }
        if line.is_empty() {
            continue;
        }

        if !seen_package {
            if let Some(expr_src) = line.strip_prefix("//go:build") {
                if expr_src.starts_with(' ') || expr_src.starts_with('\t') {
                    match parse_go_build(expr_src.trim()) {
                        Some(expr) => {
                            expr.collect_tags(&mut file.tags);
                            // The first well-formed line wins.
                            if file.go_build.is_none() {
                                file.go_build = Some(expr);
                            }
                        }
                        None => file.malformed_constraint = true,
                    }
                }
                continue;
            }
            if let Some(terms) = line.strip_prefix("// +build") {
                if terms.is_empty() || terms.starts_with(' ') {
                    match parse_plus_build(terms.trim()) {
                        Some(expr) => {
                            expr.collect_tags(&mut file.tags);
                            file.plus_build.push(expr);
                        }
                        None => file.malformed_constraint = true,
                    }
                }
                continue;
            }
            if line.starts_with("//") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("package") {
                if rest.starts_with(' ') || rest.starts_with('\t') {
                    let pkg = strip_line_comment(rest).trim();
                    if let Some(pkg) = pkg.split_whitespace().next() {
                        file.package_name = pkg.to_string();
                        seen_package = true;
                        continue;
                    }
                }
            }
            // Anything else before a package clause means this is not a Go
            // source file we can use.
            return None;
        }

        let line = strip_line_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if in_import_block {
            if let Some(path) = quoted(line) {
                file.imports.push(path.to_string());
            }
            if line.ends_with(')') {
                in_import_block = false;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("import") {
            let rest = rest.trim_start();
            if let Some(inner) = rest.strip_prefix('(') {
                in_import_block = true;
                let mut inner = inner.trim();
                if let Some(closed) = inner.strip_suffix(')') {
                    in_import_block = false;
                    inner = closed.trim();
                }
                // Collect every quoted path on the opening line.
                let mut remainder = inner;
                while let Some(path) = quoted(remainder) {
                    file.imports.push(path.to_string());
                    let consumed = remainder.find('"').unwrap_or(0) + path.len() + 2;
                    remainder = &remainder[consumed..];
                }
            } else if let Some(path) = quoted(rest) {
                file.imports.push(path.to_string());
            }
            continue;
        }

        if ["func", "type", "var", "const"]
            .iter()
            .any(|kw| line == *kw || line.starts_with(&format!("{kw} ")) || line.starts_with(&format!("{kw}(")))
        {
            // Imports must precede other declarations; nothing left to scan.
            break;
        }
    }

    if seen_package { Some(file) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_and_grouped_imports() {
        let src = r#"
// Package demo does things.
package demo

import "fmt"
import x "example.org/x/lib"

import (
    "os"
    alias "example.org/y/lib" // aliased
    _ "example.org/z/driver"
)

func main() {}
"#;
        let file = parse_go_source("demo.go", src).unwrap();
        assert_eq!(file.package_name, "demo");
        assert_eq!(
            file.imports,
            vec![
                "fmt",
                "example.org/x/lib",
                "os",
                "example.org/y/lib",
                "example.org/z/driver"
            ]
        );
    }

    #[test]
    fn stops_at_first_declaration() {
        let src = r#"
package demo

import "fmt"

func f() {
    s := "import \"not/a/real/import\""
    _ = s
}
"#;
        let file = parse_go_source("demo.go", src).unwrap();
        assert_eq!(file.imports, vec!["fmt"]);
    }

    #[test]
    fn collects_build_constraints_before_package() {
        let src = "//go:build linux && !cgo\n// +build linux,!cgo\n\npackage demo\n";
        let file = parse_go_source("demo.go", src).unwrap();
        assert!(file.go_build.is_some());
        assert_eq!(file.plus_build.len(), 1);
        assert!(file.tags.contains("linux"));
        assert!(file.tags.contains("cgo"));
    }

    #[test]
    fn go_build_wins_over_plus_build() {
        let src = "//go:build windows\n// +build linux\n\npackage demo\n";
        let file = parse_go_source("demo.go", src).unwrap();
        let mut ctx = BuildContext::new("/go");
        ctx.goos = "linux".to_string();
        assert!(!file.constraints_satisfied(&ctx));
    }

    #[test]
    fn malformed_constraint_excludes_file() {
        let src = "//go:build linux &&\n\npackage demo\n";
        let file = parse_go_source("demo.go", src).unwrap();
        let ctx = BuildContext::new("/go");
        assert!(!file.constraints_satisfied(&ctx));
    }

    #[test]
    fn block_comments_are_skipped() {
        let src = "/*\nnot package yet\n*/\npackage demo\n\nimport \"fmt\"\n";
        let file = parse_go_source("demo.go", src).unwrap();
        assert_eq!(file.package_name, "demo");
        assert_eq!(file.imports, vec!["fmt"]);
    }

    #[test]
    fn non_go_content_is_rejected() {
        assert!(parse_go_source("junk.go", "this is not go source\n").is_none());
        assert!(parse_go_source("empty.go", "").is_none());
    }

    #[test]
    fn external_test_detection() {
        let src = "package demo_test\n\nimport \"testing\"\n";
        let file = parse_go_source("demo_ext_test.go", src).unwrap();
        assert!(file.is_test());
        assert!(file.is_external_test());

        let src = "package demo\n\nimport \"testing\"\n";
        let file = parse_go_source("demo_int_test.go", src).unwrap();
        assert!(file.is_test());
        assert!(!file.is_external_test());
    }
}
