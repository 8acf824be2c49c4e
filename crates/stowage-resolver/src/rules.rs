//! Static import-path rule tables and their site-specific checks.

use crate::error::{ResolverError, Result};
use crate::http::HttpClients;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use stowage_vcs::{Driver, VcsKind};
use tracing::debug;

/// Site-specific follow-up run after a rule's regex matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleCheck {
    /// Reject repository names ending in a VCS suffix (`.git` et al).
    NoVcsSuffix,
    /// Scrape the legacy Google Code checkout page for the VCS.
    GoogleCode,
    /// Old `<project>.googlecode.com` paths always error with the new form.
    OldGoogleCode,
    /// Ask the Bitbucket API whether the repository is git or hg.
    Bitbucket,
    /// Disambiguate Launchpad series vs. in-branch directories.
    Launchpad,
}

/// One prefix rule: how to turn an import path into a repository.
pub(crate) struct PathRule {
    /// Prefix this rule applies to; empty matches everything.
    pub prefix: &'static str,
    /// Pattern with named groups (`root`, `repo`, `vcs`, ...).
    pub re: Regex,
    /// Repository template, expanded with the match map.
    pub repo: Option<&'static str>,
    /// VCS template, expanded with the match map.
    pub vcs: Option<&'static str>,
    /// Additional site-specific check.
    pub check: Option<RuleCheck>,
    /// Probe candidate schemes with the driver's ping operation.
    pub ping: bool,
}

fn rule(
    prefix: &'static str,
    re: &str,
    repo: Option<&'static str>,
    vcs: Option<&'static str>,
    check: Option<RuleCheck>,
    ping: bool,
) -> PathRule {
    PathRule {
        prefix,
        re: Regex::new(re).unwrap(),
        repo,
        vcs,
        check,
        ping,
    }
}

/// Rules tried before dynamic discovery, in order; the general
/// `<host>/<path>.<vcs>` fallback must stay last.
pub(crate) static STATIC_RULES: Lazy<Vec<PathRule>> = Lazy::new(|| {
    vec![
        // Google Code - new syntax
        rule(
            "code.google.com/",
            r"^(?P<root>code\.google\.com/p/(?P<project>[a-z0-9\-]+)(\.(?P<subrepo>[a-z0-9\-]+))?)(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            None,
            Some(RuleCheck::GoogleCode),
            false,
        ),
        // Google Code - old syntax
        rule(
            "",
            r"^(?P<project>[a-z0-9_\-.]+)\.googlecode\.com/(git|hg|svn)(?P<path>/.*)?$",
            None,
            None,
            Some(RuleCheck::OldGoogleCode),
            false,
        ),
        // GitHub
        rule(
            "github.com/",
            r"^(?P<root>github\.com/[A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+)(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            Some("git"),
            Some(RuleCheck::NoVcsSuffix),
            false,
        ),
        // Bitbucket
        rule(
            "bitbucket.org/",
            r"^(?P<root>bitbucket\.org/(?P<bitname>[A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+))(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            None,
            Some(RuleCheck::Bitbucket),
            false,
        ),
        // IBM DevOps Services (JazzHub)
        rule(
            "hub.jazz.net/git",
            r"^(?P<root>hub\.jazz\.net/git/[a-z0-9]+/[A-Za-z0-9_.\-]+)(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            Some("git"),
            Some(RuleCheck::NoVcsSuffix),
            false,
        ),
        // Git at Apache
        rule(
            "git.apache.org",
            r"^(?P<root>git\.apache\.org/[a-z0-9_.\-]+\.git)(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            Some("git"),
            None,
            false,
        ),
        // General syntax for any server. Must be last.
        rule(
            "",
            r"^(?P<root>(?P<repo>([a-z0-9.\-]+\.)+[a-z0-9.\-]+(:[0-9]+)?(/~?[A-Za-z0-9_.\-]+)+?)\.(?P<vcs>bzr|git|hg|svn))(/~?[A-Za-z0-9_.\-]+)*$",
            None,
            None,
            None,
            true,
        ),
    ]
});

/// Rules tried after dynamic discovery fails, giving these sites a chance to
/// introduce meta tags before the hard-coded logic takes over.
pub(crate) static AFTER_DYNAMIC_RULES: Lazy<Vec<PathRule>> = Lazy::new(|| {
    vec![
        // Launchpad
        rule(
            "launchpad.net/",
            r"^(?P<root>launchpad\.net/((?P<project>[A-Za-z0-9_.\-]+)(?P<series>/[A-Za-z0-9_.\-]+)?|~[A-Za-z0-9_.\-]+/(\+junk|[A-Za-z0-9_.\-]+)/[A-Za-z0-9_.\-]+))(/[A-Za-z0-9_.\-]+)*$",
            Some("https://{root}"),
            Some("bzr"),
            Some(RuleCheck::Launchpad),
            false,
        ),
    ]
});

/// Rewrite `s`, replacing `{k}` with `map[k]` for every key.
pub(crate) fn expand_vars(map: &HashMap<String, String>, s: &str) -> String {
    let mut out = s.to_string();
    for (key, value) in map {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Run a rule's check hook; checks may rewrite `root`, `repo` and `vcs` in
/// the match map.
pub(crate) fn apply_check(
    check: RuleCheck,
    clients: &HttpClients,
    map: &mut HashMap<String, String>,
) -> Result<()> {
    match check {
        RuleCheck::NoVcsSuffix => no_vcs_suffix(map),
        RuleCheck::GoogleCode => google_code_vcs(clients, map),
        RuleCheck::OldGoogleCode => Err(ResolverError::InvalidImportPath {
            path: map.get("import").cloned().unwrap_or_default(),
            reason: format!(
                "invalid Google Code import path: use {} instead",
                expand_vars(map, "code.google.com/p/{project}{path}")
            ),
        }),
        RuleCheck::Bitbucket => bitbucket_vcs(clients, map),
        RuleCheck::Launchpad => launchpad_vcs(clients, map),
    }
}

/// The repository name must not end in `.foo` for any VCS `foo`; the usual
/// culprit is `.git`.
fn no_vcs_suffix(map: &HashMap<String, String>) -> Result<()> {
    let repo = map.get("repo").cloned().unwrap_or_default();
    for kind in stowage_vcs::types::ALL_KINDS {
        if repo.ends_with(&format!(".{}", kind.command())) {
            return Err(ResolverError::VcsSuffix {
                site: map.get("prefix").cloned().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

static GOOGLE_CHECKOUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"id="checkoutcmd">(hg|git|svn)"#).unwrap());

fn google_code_vcs(clients: &HttpClients, map: &mut HashMap<String, String>) -> Result<()> {
    no_vcs_suffix(map)?;
    let url = expand_vars(
        map,
        "https://code.google.com/p/{project}/source/checkout?repo={subrepo}",
    );
    let data = clients.get(&url)?;
    let data = String::from_utf8_lossy(&data).into_owned();

    if let Some(caps) = GOOGLE_CHECKOUT.captures(&data) {
        if let Some(kind) = VcsKind::from_command(&caps[1]) {
            if kind == VcsKind::Svn {
                // Subversion requires the old URLs.
                if map.get("subrepo").is_some_and(|subrepo| !subrepo.is_empty()) {
                    return Err(ResolverError::InvalidImportPath {
                        path: map.get("import").cloned().unwrap_or_default(),
                        reason: "sub-repositories not supported in Google Code Subversion projects"
                            .to_string(),
                    });
                }
                let repo = expand_vars(map, "https://{project}.googlecode.com/svn");
                map.insert("repo".to_string(), repo);
            }
            map.insert("vcs".to_string(), kind.command().to_string());
            return Ok(());
        }
    }
    Err(ResolverError::VcsDetection {
        site: "code.google.com/".to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct BitbucketRepo {
    scm: String,
}

/// Ask the Bitbucket API which system backs the repository; a 403 may mean a
/// private repository, in which case git then hg are pinged over https.
fn bitbucket_vcs(clients: &HttpClients, map: &mut HashMap<String, String>) -> Result<()> {
    no_vcs_suffix(map)?;

    let url = expand_vars(map, "https://api.bitbucket.org/1.0/repositories/{bitname}");
    let mut scm = String::new();
    match clients.get(&url) {
        Ok(data) => {
            let parsed: BitbucketRepo =
                serde_json::from_slice(&data).map_err(|err| ResolverError::Http {
                    url: url.clone(),
                    message: format!("decoding response: {err}"),
                    status: None,
                })?;
            scm = parsed.scm;
        }
        Err(err) => {
            if matches!(&err, ResolverError::Http { status: Some(403), .. }) {
                let root = map.get("root").cloned().unwrap_or_default();
                for kind in [VcsKind::Git, VcsKind::Hg] {
                    if Driver::new(kind).ping("https", &root).is_ok() {
                        scm = kind.command().to_string();
                        break;
                    }
                }
            }
            if scm.is_empty() {
                return Err(err);
            }
        }
    }

    debug!(scm, "bitbucket vcs detected");
    if let Some(kind) = VcsKind::from_command(&scm) {
        map.insert("vcs".to_string(), scm);
        if kind == VcsKind::Git {
            if let Some(repo) = map.get_mut("repo") {
                repo.push_str(".git");
            }
        }
        return Ok(());
    }
    Err(ResolverError::VcsDetection {
        site: "bitbucket.org/".to_string(),
    })
}

/// `launchpad.net/project/foo` is ambiguous: `foo` may be a registered
/// series with its own branch, or a directory inside the main branch. Probe
/// the series branch; when it does not exist, collapse to the project root.
fn launchpad_vcs(clients: &HttpClients, map: &mut HashMap<String, String>) -> Result<()> {
    let project = map.get("project").cloned().unwrap_or_default();
    let series = map.get("series").cloned().unwrap_or_default();
    if project.is_empty() || series.is_empty() {
        return Ok(());
    }
    let probe = expand_vars(
        map,
        "https://code.launchpad.net/{project}{series}/.bzr/branch-format",
    );
    if clients.get(&probe).is_err() {
        let root = format!("launchpad.net/{project}");
        map.insert("repo".to_string(), format!("https://{root}"));
        map.insert("root".to_string(), root);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn github_rule_matches_subpackages() {
        let github = &STATIC_RULES[2];
        assert_eq!(github.prefix, "github.com/");
        let caps = github
            .re
            .captures("github.com/user/repo/sub/pkg")
            .unwrap();
        assert_eq!(&caps["root"], "github.com/user/repo");
    }

    #[test]
    fn general_rule_extracts_vcs_suffix() {
        let general = STATIC_RULES.last().unwrap();
        let caps = general.re.captures("example.org/team/project.hg/sub").unwrap();
        assert_eq!(&caps["root"], "example.org/team/project.hg");
        assert_eq!(&caps["vcs"], "hg");
        assert_eq!(&caps["repo"], "example.org/team/project");
    }

    #[test]
    fn general_rule_rejects_plain_hosts() {
        let general = STATIC_RULES.last().unwrap();
        assert!(general.re.captures("example.org/team/project").is_none());
    }

    #[test]
    fn no_vcs_suffix_rejects_dot_git() {
        let map = map_of(&[("repo", "https://github.com/user/repo.git"), ("prefix", "github.com/")]);
        let err = no_vcs_suffix(&map).unwrap_err();
        assert!(matches!(err, ResolverError::VcsSuffix { .. }));

        let ok = map_of(&[("repo", "https://github.com/user/repo"), ("prefix", "github.com/")]);
        assert!(no_vcs_suffix(&ok).is_ok());
    }

    #[test]
    fn expand_vars_replaces_all_keys() {
        let map = map_of(&[("project", "widgets"), ("subrepo", "docs")]);
        assert_eq!(
            expand_vars(&map, "https://code.google.com/p/{project}?repo={subrepo}"),
            "https://code.google.com/p/widgets?repo=docs"
        );
    }

    #[test]
    fn launchpad_rule_groups() {
        let lp = &AFTER_DYNAMIC_RULES[0];
        let caps = lp.re.captures("launchpad.net/juju-core/trunk").unwrap();
        assert_eq!(&caps["project"], "juju-core");
        assert_eq!(&caps["series"], "/trunk");
    }
}
