//! Command-template driver for the supported systems.

use crate::error::{Result, VcsError};
use crate::types::VcsKind;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Per-system command templates.
///
/// Templates are whitespace-split before placeholder expansion, so values
/// containing spaces stay single arguments.
struct CommandSet {
    create: &'static [&'static str],
    create_rev: &'static [&'static str],
    ping: &'static str,
    schemes: &'static [&'static str],
}

const GIT_COMMANDS: CommandSet = CommandSet {
    create: &[
        "clone {repo} {dir}",
        "-C {dir} submodule update --init --recursive",
    ],
    create_rev: &[
        "clone {repo} {dir}",
        "-C {dir} submodule update --init --recursive",
        "-C {dir} checkout {rev}",
        "-C {dir} reset --hard {rev}",
    ],
    ping: "ls-remote {scheme}://{repo}",
    schemes: &["git", "https", "http", "git+ssh", "ssh"],
};

const HG_COMMANDS: CommandSet = CommandSet {
    create: &["clone -U {repo} {dir}"],
    create_rev: &["clone --updaterev {rev} {repo} {dir}"],
    ping: "identify {scheme}://{repo}",
    schemes: &["https", "http", "ssh"],
};

const SVN_COMMANDS: CommandSet = CommandSet {
    create: &["checkout {repo} {dir}"],
    create_rev: &["checkout {repo} -r {rev} {dir}"],
    ping: "info {scheme}://{repo}",
    schemes: &["https", "http", "svn", "svn+ssh"],
};

const BZR_COMMANDS: CommandSet = CommandSet {
    create: &["branch {repo} {dir}"],
    create_rev: &["branch {repo} -r {rev} {dir}"],
    ping: "info {scheme}://{repo}",
    schemes: &["https", "http", "bzr", "bzr+ssh"],
};

const fn commands_for(kind: VcsKind) -> &'static CommandSet {
    match kind {
        VcsKind::Git => &GIT_COMMANDS,
        VcsKind::Hg => &HG_COMMANDS,
        VcsKind::Svn => &SVN_COMMANDS,
        VcsKind::Bzr => &BZR_COMMANDS,
    }
}

/// Expand `{key}` placeholders in a template, after argument splitting.
#[must_use]
pub fn expand(template: &str, vars: &[(&str, &str)]) -> Vec<String> {
    template
        .split_whitespace()
        .map(|arg| {
            let mut arg = arg.to_string();
            for (key, value) in vars {
                arg = arg.replace(&format!("{{{key}}}"), value);
            }
            arg
        })
        .collect()
}

/// Driver for one version-control system.
#[derive(Debug, Clone, Copy)]
pub struct Driver {
    kind: VcsKind,
}

impl Driver {
    /// Create a driver for the given system.
    #[must_use]
    pub const fn new(kind: VcsKind) -> Self {
        Self { kind }
    }

    /// The system this driver speaks for.
    #[must_use]
    pub const fn kind(&self) -> VcsKind {
        self.kind
    }

    /// Preferred URL schemes, most preferred first.
    #[must_use]
    pub fn schemes(&self) -> &'static [&'static str] {
        commands_for(self.kind).schemes
    }

    /// Fetch a fresh copy of `repo` into `dir` at the default branch head.
    ///
    /// The parent of `dir` must exist; `dir` must not.
    ///
    /// # Errors
    /// [`VcsError::ToolMissing`] when the binary is absent,
    /// [`VcsError::CommandFailed`] on non-zero exit.
    pub fn create(&self, dir: &Path, repo: &str) -> Result<()> {
        let dir_str = dir.to_string_lossy();
        for template in commands_for(self.kind).create {
            let args = expand(template, &[("dir", &dir_str), ("repo", repo)]);
            self.run(Path::new("."), &args)?;
        }
        Ok(())
    }

    /// Fetch `repo` into `dir` checked out at `revision`.
    ///
    /// # Errors
    /// Same failure modes as [`Driver::create`].
    pub fn create_at_revision(&self, dir: &Path, repo: &str, revision: &str) -> Result<()> {
        let dir_str = dir.to_string_lossy();
        for template in commands_for(self.kind).create_rev {
            let args = expand(
                template,
                &[("dir", &dir_str), ("repo", repo), ("rev", revision)],
            );
            self.run(Path::new("."), &args)?;
        }
        Ok(())
    }

    /// Probe whether `repo` is reachable over `scheme`.
    ///
    /// # Errors
    /// Fails when the probe command does, which is the signal callers use
    /// to move on to the next scheme.
    pub fn ping(&self, scheme: &str, repo: &str) -> Result<()> {
        let args = expand(
            commands_for(self.kind).ping,
            &[("scheme", scheme), ("repo", repo)],
        );
        self.run(Path::new("."), &args).map(|_| ())
    }

    /// Revision currently checked out in `dir`.
    ///
    /// # Errors
    /// Fails when the working copy cannot answer, e.g. an empty repository.
    pub fn current_revision(&self, dir: &Path) -> Result<String> {
        let output = match self.kind {
            VcsKind::Git => self.run(dir, &["rev-parse".into(), "HEAD".into()])?,
            VcsKind::Hg => self.run(
                dir,
                &["parent".into(), "--template".into(), "{node}".into()],
            )?,
            // Subversion reports the working-copy revision through a
            // dedicated binary.
            VcsKind::Svn => run_command("svnversion", &[], dir, self.kind.display_name())?,
            VcsKind::Bzr => self.run(dir, &["revno".into()])?,
        };
        Ok(output)
    }

    /// Run one command for this driver's binary inside `dir`, returning
    /// trimmed merged output.
    pub(crate) fn run(&self, dir: &Path, args: &[String]) -> Result<String> {
        run_command(self.kind.command(), args, dir, self.kind.display_name())
    }
}

/// Spawn `program args…` in `dir`; merge stdout and stderr, trim, and map
/// failures to driver errors.
fn run_command(
    program: &str,
    args: &[String],
    dir: &Path,
    display_name: &'static str,
) -> Result<String> {
    let rendered = render(program, args);
    debug!(command = %rendered, dir = %dir.display(), "run vcs command");

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        // Subprocesses see the ambient environment with PWD pinned, so a
        // getcwd in the child resolves without hitting the filesystem.
        .env("PWD", dir)
        .output()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                VcsError::ToolMissing { vcs: display_name }
            } else {
                VcsError::io(dir, &err)
            }
        })?;

    let mut merged = output.stdout;
    merged.extend_from_slice(&output.stderr);
    let merged = String::from_utf8_lossy(&merged).trim().to_string();

    if !output.status.success() {
        return Err(VcsError::CommandFailed {
            command: rendered,
            output: merged,
            exit_code: output.status.code(),
        });
    }
    Ok(merged)
}

fn render(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn expand_substitutes_after_splitting() {
        let args = expand(
            "clone --updaterev {rev} {repo} {dir}",
            &[
                ("rev", "abc123"),
                ("repo", "https://example.org/x"),
                ("dir", "/tmp/with space"),
            ],
        );
        assert_eq!(
            args,
            vec!["clone", "--updaterev", "abc123", "https://example.org/x", "/tmp/with space"]
        );
    }

    #[test]
    fn expand_leaves_unknown_placeholders() {
        // hg's template braces must survive the expansion pass untouched.
        let args = expand("parent --template {node}", &[("rev", "abc")]);
        assert_eq!(args, vec!["parent", "--template", "{node}"]);
    }

    #[test]
    fn missing_tool_is_reported_by_name() {
        let err = run_command("definitely-not-a-vcs-binary", &[], Path::new("."), "Bazaar")
            .unwrap_err();
        assert!(matches!(err, VcsError::ToolMissing { vcs: "Bazaar" }));
        assert!(err.to_string().contains("Bazaar"));
    }

    #[test]
    fn nonzero_exit_captures_output() {
        // `false` exists everywhere we run tests and produces exit code 1.
        let err = run_command("false", &[], Path::new("."), "Git").unwrap_err();
        match err {
            VcsError::CommandFailed { exit_code, .. } => assert_eq!(exit_code, Some(1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn git_create_rev_templates_include_reset() {
        let set = commands_for(VcsKind::Git);
        assert_eq!(set.create_rev.len(), 4);
        assert!(set.create_rev[3].contains("reset --hard"));
    }
}
