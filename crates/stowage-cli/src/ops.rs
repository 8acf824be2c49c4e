//! The three run modes.

use crate::commands::Cli;
use anyhow::{Context, bail};
use parking_lot::Mutex;
use std::env;
use std::path::PathBuf;
use stowage_core::Warnings;
use stowage_fetch::{FetchPool, fetch_repo, scrub_working_copy};
use stowage_gopkg::{
    BuildContext, MissingFetcher, Package, collect_project, recover_multiple, resolve_closure,
};
use stowage_manifest::{Dependency, Manifest, parse_file, validate, write_file};
use stowage_prune::{KeepSet, Whitelist, clean_vendor, unused_entries};
use stowage_resolver::{Resolver, SecurityMode};
use stowage_vcs::Driver;
use tracing::{debug, info};

const MANIFEST_NAME: &str = "vendor.conf";
const VENDOR_DIR: &str = "vendor";

/// Everything a run needs, derived once from the environment.
struct Run {
    project_root: PathBuf,
    project_import_path: String,
    vendor_dir: PathBuf,
    manifest_path: PathBuf,
    ctx: BuildContext,
    resolver: Resolver,
    warnings: Warnings,
    whitelist: Whitelist,
}

impl Run {
    fn from_environment(cli: &Cli) -> anyhow::Result<Self> {
        let project_root = env::current_dir().context("getting working directory")?;
        let gopath = env::var_os("GOPATH")
            .map(PathBuf::from)
            .context("GOPATH is not set; it must point at the Go source root")?;

        let src_root = gopath.join("src");
        let relative = project_root.strip_prefix(&src_root).map_err(|_| {
            anyhow::anyhow!(
                "{} is not under {}",
                project_root.display(),
                src_root.display()
            )
        })?;
        let project_import_path = relative
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");
        if project_import_path.is_empty() {
            bail!("run from a project directory under {}", src_root.display());
        }

        Ok(Self {
            vendor_dir: project_root.join(VENDOR_DIR),
            manifest_path: project_root.join(MANIFEST_NAME),
            ctx: BuildContext::new(gopath),
            resolver: Resolver::new()?,
            warnings: Warnings::new(),
            whitelist: Whitelist::new(&cli.whitelist)?,
            project_root,
            project_import_path,
        })
    }

    fn collect_initial(&self) -> anyhow::Result<Vec<Package>> {
        info!("Collecting local packages list");
        let initial = collect_project(&self.ctx, &self.project_root, &self.project_import_path)?;
        for pkg in &initial {
            debug!("\t{}", pkg.import_path);
        }
        Ok(initial)
    }

    fn closure_and_prune(
        &self,
        initial: &[Package],
        fetcher: Option<&dyn MissingFetcher>,
        manifest_entries: &[Dependency],
    ) -> anyhow::Result<()> {
        info!("Collecting all dependencies");
        let closure = resolve_closure(
            &self.ctx,
            &self.project_root,
            initial,
            fetcher,
            &self.warnings,
        )?;
        info!("All dependencies collected");

        let keep = KeepSet::from_packages(&closure);
        for import_path in unused_entries(
            &self.vendor_dir,
            &keep,
            manifest_entries.iter().map(|d| d.import_path.as_str()),
        ) {
            self.warnings.warn(format!(
                "package {import_path} is unused, consider removing it from {MANIFEST_NAME}"
            ));
        }

        info!("Clean vendor dir from unused packages");
        clean_vendor(&self.vendor_dir, &keep, &self.whitelist)?;
        Ok(())
    }

    fn finish_strict(&self, strict: bool) -> anyhow::Result<()> {
        if strict && !self.warnings.is_empty() {
            bail!(
                "{} warning(s) collected, failing under --strict",
                self.warnings.len()
            );
        }
        Ok(())
    }
}

/// Entry point: pick the mode and run it.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let run = Run::from_environment(cli)?;
    match cli.package.as_deref() {
        Some("init") => run_init(&run)?,
        Some(package) => run_single(&run, package, cli.revision.as_deref(), cli.repo_url.as_deref())?,
        None => run_default(&run)?,
    }
    run.finish_strict(cli.strict)
}

/// Full run: fetch everything the manifest pins, then prune.
fn run_default(run: &Run) -> anyhow::Result<()> {
    let initial = run.collect_initial()?;

    let manifest = parse_file(&run.manifest_path)?;
    validate(
        &run.manifest_path,
        &manifest.entries,
        &run.resolver,
        &run.warnings,
    )?;
    let deps = manifest.sorted();

    info!("Download dependencies");
    FetchPool::new().fetch_all(&run.vendor_dir, &deps, &run.resolver, SecurityMode::Secure)?;
    info!("Dependencies downloaded");

    run.closure_and_prune(&initial, None, &deps)
}

/// Revendor one package, taking omitted fields from the manifest.
fn run_single(
    run: &Run,
    package: &str,
    revision: Option<&str>,
    repo_url: Option<&str>,
) -> anyhow::Result<()> {
    let manifest = if run.manifest_path.exists() {
        parse_file(&run.manifest_path)?
    } else {
        Manifest::default()
    };
    let known = manifest.lookup(package);

    let revision = revision
        .map(str::to_string)
        .or_else(|| known.map(|dep| dep.revision.clone()))
        .with_context(|| format!("no revision known for {package}; specify one"))?;
    let repo_url = repo_url
        .map(str::to_string)
        .or_else(|| known.and_then(|dep| dep.repo_url.clone()));
    let dep = Dependency {
        import_path: known.map_or_else(|| package.to_string(), |d| d.import_path.clone()),
        revision,
        repo_url,
    };

    let initial = run.collect_initial()?;

    info!("Download dependency {}", dep.import_path);
    FetchPool::new().fetch_all(
        &run.vendor_dir,
        std::slice::from_ref(&dep),
        &run.resolver,
        SecurityMode::Secure,
    )?;

    run.closure_and_prune(&initial, None, &manifest.entries)
}

/// Bootstrap: discover dependencies, fetch them at head, write a manifest.
fn run_init(run: &Run) -> anyhow::Result<()> {
    if run.manifest_path.exists() {
        bail!("{MANIFEST_NAME} already exists; init would overwrite it");
    }
    if run.vendor_dir.exists() {
        bail!("{VENDOR_DIR} directory already exists; init would overwrite it");
    }

    let initial = run.collect_initial()?;
    let fetcher = InitFetcher {
        run,
        discovered: Mutex::new(Vec::new()),
    };
    run.closure_and_prune(&initial, Some(&fetcher as &dyn MissingFetcher), &[])?;

    let mut discovered = fetcher.discovered.into_inner();
    discovered.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    discovered.dedup_by(|a, b| a.import_path == b.import_path);
    info!(
        "Writing {MANIFEST_NAME} with {} dependencies",
        discovered.len()
    );
    write_file(&run.manifest_path, &discovered)?;
    Ok(())
}

/// Init-mode downloader: clone at the default branch head, record the
/// revision the clone landed on, strip the working copy, and load the
/// package back out of the vendor tree.
struct InitFetcher<'a> {
    run: &'a Run,
    discovered: Mutex<Vec<Dependency>>,
}

impl MissingFetcher for InitFetcher<'_> {
    fn fetch(
        &self,
        import_path: &str,
    ) -> std::result::Result<Package, Box<dyn std::error::Error + Send + Sync>> {
        info!("\tclone {import_path}");
        let copy = fetch_repo(
            &self.run.vendor_dir,
            import_path,
            None,
            None,
            &self.run.resolver,
            SecurityMode::Secure,
        )?;
        let revision = Driver::new(copy.kind).current_revision(&copy.dir)?;
        scrub_working_copy(&copy)?;
        self.discovered
            .lock()
            .push(Dependency::new(copy.import_root.clone(), revision));
        info!("\tfinished clone {import_path}");

        let pkg = recover_multiple(self.run.ctx.import_by_path(
            import_path,
            &self.run.project_root,
            true,
        ))?;
        Ok(pkg)
    }
}
