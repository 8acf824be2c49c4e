//! `go-import` meta-tag extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// One parsed `<meta name="go-import" content="prefix vcs reporoot"/>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaImport {
    /// Import-path prefix the tag claims.
    pub prefix: String,
    /// VCS command name (`git`, `hg`, ...).
    pub vcs: String,
    /// Repository root URL, scheme included.
    pub repo_root: String,
}

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\s[^>]*?/?>").unwrap());
static NAME_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static CONTENT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static HEAD_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</head>|<body\b").unwrap());

fn attr_value<'a>(tag: &'a str, re: &Regex) -> Option<&'a str> {
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Extract `go-import` meta tags from an HTML document.
///
/// Only the document head is considered; tags with a `content` attribute
/// that does not hold exactly three space-separated fields are dropped.
#[must_use]
pub fn parse_meta_go_imports(html: &[u8]) -> Vec<MetaImport> {
    let html = String::from_utf8_lossy(html);
    let head = match HEAD_END.find(&html) {
        Some(m) => &html[..m.start()],
        None => &html,
    };

    let mut imports = Vec::new();
    for tag in META_TAG.find_iter(head) {
        let tag = tag.as_str();
        if attr_value(tag, &NAME_ATTR) != Some("go-import") {
            continue;
        }
        let Some(content) = attr_value(tag, &CONTENT_ATTR) else {
            continue;
        };
        let fields: Vec<&str> = content.split_whitespace().collect();
        if let [prefix, vcs, repo_root] = fields[..] {
            imports.push(MetaImport {
                prefix: prefix.to_string(),
                vcs: vcs.to_string(),
                repo_root: repo_root.to_string(),
            });
        }
    }
    imports
}

/// Outcome of matching meta tags against an import path.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MetaMatch {
    /// Exactly one tag's prefix covers the path.
    One(MetaImport),
    /// No tag covers the path.
    None,
    /// More than one tag covers the path.
    Multiple,
}

/// Select the tag whose `prefix` is a prefix of `import_path`.
pub(crate) fn match_go_import(imports: &[MetaImport], import_path: &str) -> MetaMatch {
    let mut found: Option<&MetaImport> = None;
    for import in imports {
        if !import_path.starts_with(&import.prefix) {
            continue;
        }
        if found.is_some() {
            return MetaMatch::Multiple;
        }
        found = Some(import);
    }
    match found {
        Some(import) => MetaMatch::One(import.clone()),
        None => MetaMatch::None,
    }
}
