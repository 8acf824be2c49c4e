//! Loading packages from directories and resolving import paths.

use crate::context::{BuildContext, KNOWN_ARCH, KNOWN_OS};
use crate::error::{LoadError, Result};
use crate::package::{Package, is_std_lib_path};
use crate::parser::parse_go_file;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Tags implied by a file's name, e.g. `foo_linux_amd64.go` mentions both
/// `linux` and `amd64`.
fn filename_tags(name: &str, out: &mut BTreeSet<String>) {
    let base = name.strip_suffix(".go").unwrap_or(name);
    let base = base.strip_suffix("_test").unwrap_or(base);
    let Some(idx) = base.find('_') else { return };
    for part in base[idx + 1..].split('_') {
        if KNOWN_OS.contains(&part) || KNOWN_ARCH.contains(&part) {
            out.insert(part.to_string());
        }
    }
}

impl BuildContext {
    /// Load the package in `dir`, reporting it as `import_path`.
    ///
    /// # Errors
    /// [`LoadError::NoGoFiles`] when the directory holds no usable Go
    /// source; [`LoadError::MultiplePackages`] when files disagree on the
    /// package name — the descriptor inside that error is still complete.
    pub fn import_dir(&self, dir: &Path, import_path: &str) -> Result<Package> {
        let entries = fs::read_dir(dir).map_err(|err| LoadError::io(dir, &err))?;
        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| LoadError::io(dir, &err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".go") || name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            if entry.file_type().map_err(|err| LoadError::io(dir, &err))?.is_dir() {
                continue;
            }
            names.push(name);
        }
        names.sort();
        if names.is_empty() {
            return Err(LoadError::NoGoFiles {
                dir: dir.to_path_buf(),
            });
        }

        let mut pkg = Package {
            import_path: import_path.to_string(),
            dir: dir.to_path_buf(),
            ..Package::default()
        };
        let mut tags = BTreeSet::new();
        let mut package_names = BTreeSet::new();
        let mut imports = BTreeSet::new();
        let mut test_imports = BTreeSet::new();
        let mut xtest_imports = BTreeSet::new();
        let mut contributed = false;

        for name in names {
            let path = dir.join(&name);
            let Some(file) = parse_go_file(&path)? else {
                trace!(path = %path.display(), "skipping unparseable file");
                continue;
            };

            for tag in &file.tags {
                tags.insert(tag.clone());
            }
            filename_tags(&name, &mut tags);

            let included =
                self.filename_included(&name) && file.constraints_satisfied(self);
            if !included {
                pkg.ignored_go_files.push(name.clone());
            }
            if !included && !self.use_all_files {
                continue;
            }
            contributed = true;

            if file.is_test() {
                let target = if file.is_external_test() {
                    &mut xtest_imports
                } else {
                    &mut test_imports
                };
                target.extend(file.imports.iter().cloned());
                continue;
            }

            package_names.insert(file.package_name.clone());
            if included {
                pkg.go_files.push(name);
            }
            imports.extend(file.imports.iter().cloned());
        }

        if !contributed {
            return Err(LoadError::NoGoFiles {
                dir: dir.to_path_buf(),
            });
        }

        pkg.imports = imports.into_iter().collect();
        pkg.test_imports = test_imports.into_iter().collect();
        pkg.xtest_imports = xtest_imports.into_iter().collect();
        pkg.all_tags = tags.into_iter().collect();

        if package_names.len() > 1 {
            return Err(LoadError::MultiplePackages {
                dir: dir.to_path_buf(),
                names: package_names.into_iter().collect(),
                package: Box::new(pkg),
            });
        }
        Ok(pkg)
    }

    /// Resolve `import_path` as seen from `src_dir`.
    ///
    /// Standard-library paths return a stub descriptor. With `use_vendor`,
    /// `vendor/` directories are searched from `src_dir` upwards to the
    /// source root before falling back to `<src root>/<import path>`.
    pub fn import_by_path(
        &self,
        import_path: &str,
        src_dir: &Path,
        use_vendor: bool,
    ) -> Result<Package> {
        if is_std_lib_path(import_path) {
            return Ok(Package::std_lib(import_path));
        }

        let relative = relative_path(import_path);
        if use_vendor {
            let mut dir = Some(src_dir);
            while let Some(current) = dir {
                if !self.under_src_root(current) {
                    break;
                }
                let candidate = current.join("vendor").join(&relative);
                if has_go_files(&candidate) {
                    return self.import_dir(&candidate, import_path);
                }
                dir = current.parent();
            }
        }

        let candidate = self.src_root().join(&relative);
        if candidate.is_dir() {
            return self.import_dir(&candidate, import_path);
        }
        Err(LoadError::CannotFind {
            import_path: import_path.to_string(),
        })
    }
}

/// An import path as a relative filesystem path.
fn relative_path(import_path: &str) -> PathBuf {
    import_path.split('/').collect()
}

/// Whether `dir` exists and directly contains at least one `.go` file.
fn has_go_files(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".go")
            && !name.starts_with('.')
            && !name.starts_with('_')
            && entry.file_type().is_ok_and(|t| t.is_file())
        {
            return true;
        }
    }
    false
}
