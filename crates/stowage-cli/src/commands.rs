//! Command-line surface.

use clap::Parser;

/// Vendor a Go project's dependencies at pinned revisions.
///
/// With no arguments: read `vendor.conf`, fetch every dependency, and prune
/// the vendor tree. With a package argument: revendor that one package,
/// looking up omitted fields in the manifest. With `init`: discover the
/// project's dependencies, fetch them at their default-branch heads, and
/// write a fresh manifest.
#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(version)]
#[command(about = "Vendor a Go project's dependencies at pinned revisions")]
pub struct Cli {
    /// Increase log verbosity: -v for debug, -vv for trace
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Fail with a non-zero exit when any warning was collected
    #[arg(long)]
    pub strict: bool,

    /// Vendor-relative path pattern pruning must not touch (repeatable;
    /// matched anchored against the whole path)
    #[arg(long, value_name = "REGEX")]
    pub whitelist: Vec<String>,

    /// Import path to vendor, or `init` to bootstrap a manifest
    #[arg(value_name = "IMPORT_PATH")]
    pub package: Option<String>,

    /// Revision to pin; defaults to the manifest entry's revision
    #[arg(value_name = "REVISION")]
    pub revision: Option<String>,

    /// Repository URL override; defaults to the manifest entry's, if any
    #[arg(value_name = "REPO_URL")]
    pub repo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_forms_parse() {
        let cli = Cli::parse_from(["stowage"]);
        assert!(cli.package.is_none());

        let cli = Cli::parse_from(["stowage", "init"]);
        assert_eq!(cli.package.as_deref(), Some("init"));

        let cli = Cli::parse_from([
            "stowage",
            "example.org/x/net",
            "abc123",
            "https://mirror.example.org/net.git",
        ]);
        assert_eq!(cli.package.as_deref(), Some("example.org/x/net"));
        assert_eq!(cli.revision.as_deref(), Some("abc123"));
        assert!(cli.repo_url.is_some());
    }

    #[test]
    fn whitelist_flag_repeats() {
        let cli = Cli::parse_from([
            "stowage",
            "--whitelist",
            "archive/tar/.*",
            "--whitelist",
            "foo/.*",
            "--strict",
        ]);
        assert_eq!(cli.whitelist.len(), 2);
        assert!(cli.strict);
    }
}
