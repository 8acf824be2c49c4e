//! Project package collection and transitive import resolution.

use crate::context::BuildContext;
use crate::error::{LoadError, Result, recover_multiple};
use crate::package::Package;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use stowage_core::Warnings;
use tracing::debug;
use walkdir::WalkDir;

/// Init-mode capability: materialize a missing dependency into the vendor
/// tree and return its loaded package. Implementations record the resolved
/// `(import root, revision)` pairs on the side for manifest synthesis.
pub trait MissingFetcher {
    /// Fetch the repository behind `import_path` and load the package.
    fn fetch(
        &self,
        import_path: &str,
    ) -> std::result::Result<Package, Box<dyn std::error::Error + Send + Sync>>;
}

/// Load every package under `project_root`, excluding the vendor subtree.
///
/// Directories whose files disagree on the package name are kept (their
/// import lists are what matters here); directories without Go files are
/// skipped.
pub fn collect_project(
    ctx: &BuildContext,
    project_root: &Path,
    project_import_path: &str,
) -> Result<Vec<Package>> {
    let vendor_dir = project_root.join("vendor");
    let mut packages = Vec::new();

    let mut it = WalkDir::new(project_root).sort_by_file_name().into_iter();
    while let Some(entry) = it.next() {
        let entry = entry.map_err(|err| LoadError::Io {
            path: project_root.to_path_buf(),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if path == vendor_dir {
            it.skip_current_dir();
            continue;
        }
        if path != project_root {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                it.skip_current_dir();
                continue;
            }
        }

        let import_path = match path.strip_prefix(project_root) {
            Ok(rel) if rel.as_os_str().is_empty() => project_import_path.to_string(),
            Ok(rel) => format!(
                "{project_import_path}/{}",
                rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/")
            ),
            Err(_) => continue,
        };

        match recover_multiple(ctx.import_dir(path, &import_path)) {
            Ok(pkg) => packages.push(pkg),
            Err(LoadError::NoGoFiles { .. }) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(packages)
}

/// Compute the transitive closure of the project's imports.
///
/// Worklist from `initial` (the project's own packages, all treated as
/// roots): every package contributes its imports, roots additionally
/// contribute test and external-test imports. Imports resolve with vendor
/// search enabled; the standard library and the cgo pseudo-import are
/// skipped. An import that is missing or resolves outside the project is
/// handed to `fetcher` when present, otherwise it produces a
/// "not vendored" warning and is skipped.
pub fn resolve_closure(
    ctx: &BuildContext,
    project_root: &Path,
    initial: &[Package],
    fetcher: Option<&dyn MissingFetcher>,
    warnings: &Warnings,
) -> Result<Vec<Package>> {
    let mut cache: BTreeMap<String, Package> = BTreeMap::new();
    let mut roots: HashSet<String> = HashSet::new();
    for pkg in initial {
        roots.insert(pkg.import_path.clone());
        cache.insert(pkg.import_path.clone(), pkg.clone());
    }

    let mut deps: Vec<Package> = initial.to_vec();
    while !deps.is_empty() {
        let mut new_deps: Vec<Package> = Vec::new();
        for pkg in &deps {
            if pkg.in_std_lib {
                continue;
            }
            let mut imports: Vec<&String> = pkg.imports.iter().collect();
            if roots.contains(&pkg.import_path) {
                imports.extend(pkg.test_imports.iter());
                imports.extend(pkg.xtest_imports.iter());
            }

            for import in imports {
                if import == "C" || cache.contains_key(import) {
                    continue;
                }

                let resolved =
                    match recover_multiple(ctx.import_by_path(import, project_root, true)) {
                        Ok(found) => {
                            if found.in_std_lib {
                                continue;
                            }
                            // Found, but only a copy under the project (its
                            // own tree or its vendor directory) counts as
                            // vendored.
                            if found.dir.starts_with(project_root) {
                                Some(found)
                            } else {
                                None
                            }
                        }
                        Err(LoadError::CannotFind { .. }) => None,
                        Err(err) => {
                            debug!("{import}: {err}");
                            continue;
                        }
                    };

                let loaded = match resolved {
                    Some(found) => found,
                    None => match fetcher {
                        Some(fetcher) => {
                            fetcher
                                .fetch(import)
                                .map_err(|err| LoadError::Fetch {
                                    import_path: import.clone(),
                                    message: err.to_string(),
                                })?
                        }
                        None => {
                            warnings.warn(format!("{import} is not vendored"));
                            continue;
                        }
                    },
                };

                cache.insert(import.clone(), loaded.clone());
                new_deps.push(loaded);
            }
        }
        deps = new_deps;
    }

    Ok(cache.into_values().collect())
}
