//! Remote-URL queries against existing working copies.

use crate::driver::Driver;
use crate::error::{Result, VcsError};
use crate::types::VcsKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// SCP-like addresses used by git over SSH, e.g. `git@github.com:user/repo`.
static SCP_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9_]+)@([a-zA-Z0-9._-]+):(.*)$").unwrap());

impl Driver {
    /// The remote URL a working copy in `dir` was fetched from.
    ///
    /// # Errors
    /// Fails when the working copy has no remote configured or its answer
    /// cannot be interpreted.
    pub fn remote_repo(&self, dir: &Path) -> Result<String> {
        match self.kind() {
            VcsKind::Git => git_remote(self, dir),
            VcsKind::Hg => {
                let out = self.run(dir, &["paths".into(), "default".into()])?;
                Ok(out.trim().to_string())
            }
            VcsKind::Svn => svn_remote(self, dir),
            VcsKind::Bzr => {
                let out = self.run(dir, &["config".into(), "parent_location".into()])?;
                Ok(out.trim().to_string())
            }
        }
    }
}

fn git_remote(driver: &Driver, dir: &Path) -> Result<String> {
    let out = driver.run(
        dir,
        &["config".into(), "remote.origin.url".into()],
    )?;
    let out = out.trim();
    if out.is_empty() {
        return Err(VcsError::OutputParse {
            vcs: "Git",
            command: "config remote.origin.url",
        });
    }

    // Rewrite SCP-like syntax to a URL: "git@github.com:user/repo" becomes
    // "ssh://git@github.com/user/repo".
    if let Some(caps) = SCP_SYNTAX.captures(out) {
        return Ok(format!("ssh://{}@{}/{}", &caps[1], &caps[2], &caps[3]));
    }

    // Otherwise the remote must already carry a scheme the driver knows.
    let scheme_ok = driver
        .schemes()
        .iter()
        .any(|scheme| out.starts_with(&format!("{scheme}://")));
    if scheme_ok {
        Ok(out.to_string())
    } else {
        Err(VcsError::OutputParse {
            vcs: "Git",
            command: "config remote.origin.url",
        })
    }
}

fn svn_remote(driver: &Driver, dir: &Path) -> Result<String> {
    let out = driver.run(dir, &["info".into()])?;
    for line in out.lines() {
        if let Some(rest) = line.strip_prefix("Repository Root: ") {
            return Ok(rest.trim().to_string());
        }
    }
    Err(VcsError::OutputParse {
        vcs: "Subversion",
        command: "info",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scp_syntax_rewrites_to_ssh_url() {
        let caps = SCP_SYNTAX.captures("git@github.com:user/repo.git").unwrap();
        assert_eq!(&caps[1], "git");
        assert_eq!(&caps[2], "github.com");
        assert_eq!(&caps[3], "user/repo.git");
    }

    #[test]
    fn scp_syntax_rejects_urls() {
        assert!(SCP_SYNTAX.captures("https://github.com/user/repo").is_none());
    }
}
