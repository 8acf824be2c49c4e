//! Manifest parsing and serialization.

use crate::error::{ManifestError, Result};
use crate::types::Dependency;
use std::fs;
use std::path::Path;

/// Parsed manifest contents, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Entries as they appear in the file.
    pub entries: Vec<Dependency>,
}

impl Manifest {
    /// Entries sorted by import path, the order consumers process in.
    #[must_use]
    pub fn sorted(&self) -> Vec<Dependency> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.import_path.cmp(&b.import_path));
        entries
    }

    /// Find the entry covering `import_path`: an exact match or the entry
    /// whose import path is a path-prefix of it.
    #[must_use]
    pub fn lookup(&self, import_path: &str) -> Option<&Dependency> {
        self.entries.iter().find(|dep| {
            import_path == dep.import_path
                || import_path.starts_with(&format!("{}/", dep.import_path))
        })
    }

    /// Render to manifest syntax, one entry per line.
    #[must_use]
    pub fn render(entries: &[Dependency]) -> String {
        let mut out = String::new();
        for dep in entries {
            out.push_str(&dep.to_string());
            out.push('\n');
        }
        out
    }
}

/// Parse manifest text.
///
/// Blank lines and `#`-only lines are skipped; a trailing `#` comment is
/// stripped. Records have two or three whitespace-separated fields and a
/// present repository URL must carry a scheme.
pub fn parse(input: &str) -> Result<Manifest> {
    let mut entries = Vec::new();
    for raw in input.lines() {
        let mut line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(idx) = line.find('#') {
            line = line[..idx].trim();
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let dep = match fields[..] {
            [import_path, revision] => Dependency::new(import_path, revision),
            [import_path, revision, repo_url] => {
                if !repo_url.contains("://") {
                    return Err(ManifestError::Syntax {
                        line: line.to_string(),
                    });
                }
                Dependency {
                    repo_url: Some(repo_url.to_string()),
                    ..Dependency::new(import_path, revision)
                }
            }
            _ => {
                return Err(ManifestError::Syntax {
                    line: line.to_string(),
                });
            }
        };
        entries.push(dep);
    }
    Ok(Manifest { entries })
}

/// Parse a manifest file.
pub fn parse_file(path: &Path) -> Result<Manifest> {
    let input = fs::read_to_string(path).map_err(|err| ManifestError::io(path, &err))?;
    parse(&input)
}

/// Write entries (sorted) to `path` in manifest syntax.
pub fn write_file(path: &Path, entries: &[Dependency]) -> Result<()> {
    let mut entries = entries.to_vec();
    entries.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    fs::write(path, Manifest::render(&entries)).map_err(|err| ManifestError::io(path, &err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_records_comments_and_blanks() {
        let input = "\
# toplevel comment

example.org/x/net abc123
example.org/a/b def456 https://mirror.example.org/b.git # trailing comment
";
        let manifest = parse(input).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].import_path, "example.org/x/net");
        assert_eq!(
            manifest.entries[1].repo_url.as_deref(),
            Some("https://mirror.example.org/b.git")
        );
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert!(matches!(
            parse("example.org/x/net").unwrap_err(),
            ManifestError::Syntax { .. }
        ));
        assert!(matches!(
            parse("a b c d").unwrap_err(),
            ManifestError::Syntax { .. }
        ));
    }

    #[test]
    fn rejects_scheme_less_override() {
        let err = parse("example.org/x abc mirror.example.org/x.git").unwrap_err();
        assert!(matches!(err, ManifestError::Syntax { .. }));
    }

    #[test]
    fn sorted_does_not_disturb_file_order() {
        let manifest = parse("z.example.org/b r2\na.example.org/a r1\n").unwrap();
        let sorted = manifest.sorted();
        assert_eq!(sorted[0].import_path, "a.example.org/a");
        assert_eq!(manifest.entries[0].import_path, "z.example.org/b");
    }

    #[test]
    fn lookup_matches_subpackages_on_boundaries() {
        let manifest = parse("example.org/x abc\nexample.org/xy def\n").unwrap();
        assert_eq!(
            manifest.lookup("example.org/x/sub").unwrap().revision,
            "abc"
        );
        assert_eq!(manifest.lookup("example.org/xy").unwrap().revision, "def");
        assert!(manifest.lookup("example.org/xyz").is_none());
    }

    #[test]
    fn render_then_parse_is_fixed_point() {
        let manifest = parse("b.org/y r2\na.org/x r1 https://a.org/x.git\n").unwrap();
        let rendered = Manifest::render(&manifest.sorted());
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(reparsed.entries, manifest.sorted());
        assert_eq!(Manifest::render(&reparsed.sorted()), rendered);
    }
}
