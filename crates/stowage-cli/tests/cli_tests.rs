//! CLI integration tests.
//!
//! Everything here runs offline: fixtures live in temporary GOPATH trees
//! and the exercised paths either never reach the network (static
//! resolution, validation failures) or are already vendored on disk.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn stowage() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin("stowage"))
}

/// A temporary GOPATH with one project under `src/`.
struct Fixture {
    _temp: TempDir,
    gopath: PathBuf,
    project: PathBuf,
}

impl Fixture {
    fn new(project_import_path: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().to_path_buf();
        let project = gopath.join("src").join(project_import_path);
        fs::create_dir_all(&project).unwrap();
        Self {
            _temp: temp,
            gopath,
            project,
        }
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.project.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn command(&self) -> Command {
        let mut cmd = stowage();
        cmd.current_dir(&self.project).env("GOPATH", &self.gopath);
        cmd
    }
}

#[test]
fn help_names_the_modes_and_flags() {
    stowage()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pinned revisions"))
        .stdout(predicate::str::contains("--strict"))
        .stdout(predicate::str::contains("--whitelist"))
        .stdout(predicate::str::contains("IMPORT_PATH"));
}

#[test]
fn version_output() {
    stowage()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stowage"));
}

#[test]
fn missing_gopath_is_an_error() {
    let temp = TempDir::new().unwrap();
    stowage()
        .current_dir(temp.path())
        .env_remove("GOPATH")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOPATH"));
}

#[test]
fn project_outside_gopath_src_is_an_error() {
    let temp = TempDir::new().unwrap();
    let elsewhere = temp.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    stowage()
        .current_dir(&elsewhere)
        .env("GOPATH", temp.path().join("go"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not under"));
}

#[test]
fn malformed_manifest_line_is_reported() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n");
    fx.write("vendor.conf", "example.org/x/net\n");

    fx.command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config format"));
}

#[test]
fn subpackage_manifest_is_rejected_with_suggestion() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n");
    fx.write(
        "vendor.conf",
        "github.com/user/repo abc123\n\
         github.com/user/repo/a abc123\n\
         github.com/user/repo/b abc123\n",
    );

    fx.command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("declared 3 times"))
        .stderr(predicate::str::contains("suggested config"));

    let suggested = fs::read_to_string(fx.project.join("vendor.conf.tmp")).unwrap();
    assert_eq!(suggested, "github.com/user/repo abc123\n");
}

#[test]
fn vendored_project_prunes_and_reports_success() {
    let fx = Fixture::new("example.org/proj");
    fx.write(
        "main.go",
        "package main\n\nimport \"dep.example.org/lib\"\n\nfunc main() {}\n",
    );
    // Already vendored; the empty manifest means nothing is fetched.
    fx.write("vendor.conf", "# nothing pinned\n");
    fx.write(
        "vendor/dep.example.org/lib/lib.go",
        "package lib\n\nimport \"dep.example.org/lib/internal\"\n",
    );
    fx.write(
        "vendor/dep.example.org/lib/internal/util.go",
        "package internal\n",
    );
    fx.write("vendor/dep.example.org/lib/lib_test.go", "package lib\n");
    fx.write("vendor/dep.example.org/lib/Makefile", "all:\n");
    fx.write("vendor/dep.example.org/lib/LICENSE", "MIT\n");
    fx.write("vendor/dep.example.org/unused/u.go", "package unused\n");

    fx.command()
        .assert()
        .success()
        .stderr(predicate::str::contains("Success"));

    let vendored = |rel: &str| fx.project.join("vendor").join(rel);
    assert!(vendored("dep.example.org/lib/lib.go").exists());
    assert!(vendored("dep.example.org/lib/internal/util.go").exists());
    assert!(vendored("dep.example.org/lib/LICENSE").exists());
    assert!(!vendored("dep.example.org/lib/lib_test.go").exists());
    assert!(!vendored("dep.example.org/lib/Makefile").exists());
    assert!(!vendored("dep.example.org/unused").exists());
}

#[test]
fn whitelist_survives_pruning() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n\nfunc main() {}\n");
    fx.write("vendor.conf", "");
    fx.write("vendor/archive/tar/LICENSE", "BSD\n");

    fx.command()
        .args(["--whitelist", "archive/tar/.*"])
        .assert()
        .success();
    assert!(fx.project.join("vendor/archive/tar/LICENSE").exists());

    fx.command().assert().success();
    assert!(!fx.project.join("vendor/archive/tar").exists());
}

#[test]
fn unvendored_import_warns_and_strict_fails() {
    let fx = Fixture::new("example.org/proj");
    fx.write(
        "main.go",
        "package main\n\nimport \"gone.example.org/lib\"\n\nfunc main() {}\n",
    );
    fx.write("vendor.conf", "");

    fx.command()
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "WARNING: gone.example.org/lib is not vendored",
        ));

    fx.command()
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--strict"));
}

#[test]
fn init_refuses_existing_manifest_or_vendor() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n\nfunc main() {}\n");
    fx.write("vendor.conf", "");
    fx.command()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n\nfunc main() {}\n");
    fs::create_dir_all(fx.project.join("vendor")).unwrap();
    fx.command()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_with_no_dependencies_writes_empty_manifest() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println() }\n");

    fx.command().arg("init").assert().success();
    let manifest = fs::read_to_string(fx.project.join("vendor.conf")).unwrap();
    assert_eq!(manifest, "");
}

#[test]
fn single_package_without_revision_is_an_error() {
    let fx = Fixture::new("example.org/proj");
    fx.write("main.go", "package main\n");
    fx.write("vendor.conf", "");

    fx.command()
        .arg("dep.example.org/lib")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no revision known"));
}

fn assert_tree_unchanged(root: &Path, before: &[String]) {
    let mut after: Vec<String> = walk_files(root);
    after.sort();
    assert_eq!(before, after.as_slice());
}

fn walk_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .into_owned(),
                );
            }
        }
    }
    files
}

#[test]
fn repeated_runs_leave_an_identical_tree() {
    let fx = Fixture::new("example.org/proj");
    fx.write(
        "main.go",
        "package main\n\nimport \"dep.example.org/lib\"\n\nfunc main() {}\n",
    );
    fx.write("vendor.conf", "");
    fx.write("vendor/dep.example.org/lib/lib.go", "package lib\n");
    fx.write("vendor/dep.example.org/lib/NOTICE", "notice\n");

    fx.command().assert().success();
    let mut first = walk_files(&fx.project.join("vendor"));
    first.sort();

    fx.command().assert().success();
    assert_tree_unchanged(&fx.project.join("vendor"), &first);
}
