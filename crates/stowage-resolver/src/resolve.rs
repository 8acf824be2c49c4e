//! Import-path to repository-root resolution.

use crate::error::{ResolverError, Result};
use crate::http::HttpClients;
use crate::meta::{MetaImport, MetaMatch, match_go_import, parse_meta_go_imports};
use crate::rules::{AFTER_DYNAMIC_RULES, PathRule, STATIC_RULES, apply_check, expand_vars};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use stowage_vcs::{Driver, VcsKind, is_secure_scheme};
use tracing::debug;

/// Whether insecure transports (plain-text HTTP) may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    /// Only secure schemes.
    #[default]
    Secure,
    /// Allow http fallback and insecure VCS schemes.
    Insecure,
}

/// A resolved repository: which system, which URL, and which import path
/// corresponds to the root of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRoot {
    /// Version-control system hosting the repository.
    pub kind: VcsKind,
    /// Repository URL; carries a scheme unless every ping probe failed.
    pub repo: String,
    /// Import path of the repository root; a prefix of the requested path.
    pub root: String,
}

static HTTP_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?:").unwrap());

/// Memoized outcome of one prefix discovery.
#[derive(Debug, Clone)]
struct PrefixFetch {
    url: String,
    imports: Vec<MetaImport>,
    error: Option<String>,
}

/// Maps import paths to repository roots.
///
/// Owns the HTTP clients and the process-lifetime discovery cache; create
/// one per run and share it by reference across fetch workers.
#[derive(Debug)]
pub struct Resolver {
    http: HttpClients,
    prefix_cache: DashMap<String, Arc<OnceLock<PrefixFetch>>>,
}

impl Resolver {
    /// Create a resolver with fresh clients and an empty cache.
    ///
    /// # Errors
    /// Fails only when the TLS-backed HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpClients::new()?,
            prefix_cache: DashMap::new(),
        })
    }

    /// Resolve the repository root import path for `import_path`, using
    /// secure transports.
    pub fn resolve_root(&self, import_path: &str) -> Result<String> {
        Ok(self.resolve(import_path, SecurityMode::Secure)?.root)
    }

    /// Analyze `import_path` to determine the version-control system and
    /// repository hosting it.
    pub fn resolve(&self, import_path: &str, security: SecurityMode) -> Result<RepoRoot> {
        // A common error is to use https://packagepath because that is what
        // the VCS binaries themselves expect.
        if HTTP_PREFIX.is_match(import_path) {
            return Err(ResolverError::InvalidImportPath {
                path: import_path.to_string(),
                reason: "URL scheme not allowed in import path".to_string(),
            });
        }

        let mut result = match self.from_rules(import_path, &STATIC_RULES, security) {
            Some(matched) => matched,
            None => {
                // No static rule applies: look up the thing before any
                // wildcard, hoping the discovery covers the rest too.
                let mut lookup = import_path.trim_end_matches("/...");
                if let Some(i) = lookup.find("/.../") {
                    lookup = &lookup[..i];
                }
                self.dynamic(lookup, security)
                    .map_err(|err| ResolverError::UnknownSite {
                        path: import_path.to_string(),
                        source: Box::new(err),
                    })
            }
        };

        if result.is_err() {
            if let Some(Ok(root)) = self.from_rules(import_path, &AFTER_DYNAMIC_RULES, security) {
                result = Ok(root);
            }
        }

        let root = result?;
        if import_path.contains("...") && root.root.contains("...") {
            return Err(ResolverError::WildcardRoot {
                path: import_path.to_string(),
            });
        }
        debug!(import_path, root = %root.root, repo = %root.repo, vcs = %root.kind, "resolved");
        Ok(root)
    }

    /// Static-table VCS detection for repository-URL overrides: no network
    /// checks, no pings — only rules that can answer from the path alone.
    pub fn detect_vcs(&self, host_and_path: &str) -> Option<VcsKind> {
        for rules in [&STATIC_RULES, &AFTER_DYNAMIC_RULES] {
            for rule in rules.iter() {
                if !host_and_path.starts_with(rule.prefix) {
                    continue;
                }
                let Some(caps) = rule.re.captures(host_and_path) else {
                    continue;
                };
                let mut map = match_map(rule, &caps, host_and_path);
                if let Some(vcs_template) = rule.vcs {
                    let vcs = expand_vars(&map, vcs_template);
                    map.insert("vcs".to_string(), vcs);
                }
                if let Some(kind) = map.get("vcs").and_then(|v| VcsKind::from_command(v)) {
                    return Some(kind);
                }
            }
        }
        None
    }

    /// Try `import_path` against a rule table. `None` means no rule claimed
    /// the path; `Some(Err(..))` means a rule claimed it and failed.
    fn from_rules(
        &self,
        import_path: &str,
        rules: &[PathRule],
        security: SecurityMode,
    ) -> Option<Result<RepoRoot>> {
        for rule in rules {
            if !import_path.starts_with(rule.prefix) {
                continue;
            }
            let Some(caps) = rule.re.captures(import_path) else {
                if !rule.prefix.is_empty() {
                    return Some(Err(ResolverError::InvalidImportPath {
                        path: import_path.to_string(),
                        reason: format!("malformed {} import path", rule.prefix),
                    }));
                }
                continue;
            };

            let mut map = match_map(rule, &caps, import_path);
            if let Some(vcs_template) = rule.vcs {
                let vcs = expand_vars(&map, vcs_template);
                map.insert("vcs".to_string(), vcs);
            }
            if let Some(repo_template) = rule.repo {
                let repo = expand_vars(&map, repo_template);
                map.insert("repo".to_string(), repo);
            }
            if let Some(check) = rule.check {
                if let Err(err) = apply_check(check, &self.http, &mut map) {
                    return Some(Err(err));
                }
            }

            let vcs_name = map.get("vcs").cloned().unwrap_or_default();
            let Some(kind) = VcsKind::from_command(&vcs_name) else {
                return Some(Err(ResolverError::UnknownVcs {
                    name: vcs_name,
                    subject: import_path.to_string(),
                }));
            };

            let mut repo = map.get("repo").cloned().unwrap_or_default();
            if rule.ping {
                let driver = Driver::new(kind);
                for scheme in driver.schemes() {
                    if security == SecurityMode::Secure && !is_secure_scheme(scheme) {
                        continue;
                    }
                    if driver.ping(scheme, &repo).is_ok() {
                        repo = format!("{scheme}://{repo}");
                        break;
                    }
                }
            }

            return Some(Ok(RepoRoot {
                kind,
                repo,
                root: map.get("root").cloned().unwrap_or_default(),
            }));
        }
        None
    }

    /// Dynamic discovery for custom domains: fetch the `?go-get=1` page and
    /// read its `go-import` meta tags.
    fn dynamic(&self, import_path: &str, security: SecurityMode) -> Result<RepoRoot> {
        let host = import_path.split('/').next().unwrap_or(import_path);
        if !host.contains('.') {
            return Err(ResolverError::NoHost {
                path: import_path.to_string(),
            });
        }

        let (url, body) = self.http.discovery_page(import_path, security)?;
        let imports = parse_meta_go_imports(&body);
        let found = match match_go_import(&imports, import_path) {
            MetaMatch::One(found) => found,
            MetaMatch::Multiple => {
                return Err(ResolverError::Ambiguous {
                    url,
                    path: import_path.to_string(),
                });
            }
            MetaMatch::None => return Err(ResolverError::NoMetaTag { url }),
        };

        // If the page for "uni.edu/bob/project" claims the prefix "uni.edu"
        // with some repository, verify the claim at the prefix itself before
        // trusting Bob with the whole site.
        if found.prefix != import_path {
            let (second_url, prefix_imports) =
                self.meta_imports_for_prefix(&found.prefix, security)?;
            let verified = match match_go_import(&prefix_imports, import_path) {
                MetaMatch::One(second) if second == found => true,
                _ => false,
            };
            if !verified {
                return Err(ResolverError::DiscoveryMismatch {
                    first_url: url,
                    second_url,
                    prefix: found.prefix,
                });
            }
        }

        if !found.repo_root.contains("://") {
            return Err(ResolverError::NoScheme {
                url,
                repo_root: found.repo_root,
            });
        }
        let Some(kind) = VcsKind::from_command(&found.vcs) else {
            return Err(ResolverError::UnknownVcs {
                name: found.vcs,
                subject: url,
            });
        };
        Ok(RepoRoot {
            kind,
            repo: found.repo_root,
            root: found.prefix,
        })
    }

    /// Discovery for a declared prefix, deduplicated and memoized: the first
    /// caller for a prefix performs the fetch inside the cell initializer,
    /// concurrent callers block on the same cell, later callers hit the
    /// memo. Memoized failures are replayed as-is.
    fn meta_imports_for_prefix(
        &self,
        prefix: &str,
        security: SecurityMode,
    ) -> Result<(String, Vec<MetaImport>)> {
        let cell = {
            let entry = self
                .prefix_cache
                .entry(prefix.to_string())
                .or_insert_with(|| Arc::new(OnceLock::new()));
            Arc::clone(&entry)
        };

        let fetched = cell.get_or_init(|| match self.http.discovery_page(prefix, security) {
            Err(err) => PrefixFetch {
                url: String::new(),
                imports: Vec::new(),
                error: Some(format!("fetch {prefix}: {err}")),
            },
            Ok((url, body)) => {
                let imports = parse_meta_go_imports(&body);
                let error = if imports.is_empty() {
                    Some(format!("fetch {url}: no go-import meta tag"))
                } else {
                    None
                };
                PrefixFetch {
                    url,
                    imports,
                    error,
                }
            }
        });

        match &fetched.error {
            Some(message) => Err(ResolverError::Discovery {
                url: fetched.url.clone(),
                message: message.clone(),
            }),
            None => Ok((fetched.url.clone(), fetched.imports.clone())),
        }
    }
}

/// Build the named-submatch map for a matched rule: `prefix` and `import`
/// are always present, unmatched groups become empty strings.
fn match_map(rule: &PathRule, caps: &regex::Captures<'_>, import_path: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("prefix".to_string(), rule.prefix.to_string());
    map.insert("import".to_string(), import_path.to_string());
    for name in rule.re.capture_names().flatten() {
        let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
        map.entry(name.to_string()).or_insert_with(|| value.to_string());
    }
    map
}
