//! Manifest validation: one entry per repository root.

use crate::error::{ManifestError, Result};
use crate::parse::write_file;
use crate::types::{Dependency, is_versioned};
use std::path::Path;
use stowage_core::Warnings;
use stowage_resolver::Resolver;
use tracing::info;

/// Check that every repository root is declared exactly once, at its root.
///
/// Entries are grouped by resolved import root (declared path when a
/// repository-URL override is present). A lone entry declared below its root
/// is rewritten to the root, unless the path is a versioned import
/// (`.../vN`). Duplicate declarations merge to one entry carrying the first
/// occurrence's revision and the first non-empty override URL.
///
/// When anything fires, a corrected manifest is written to
/// `<manifest>.tmp` and validation fails.
pub fn validate(
    manifest_path: &Path,
    entries: &[Dependency],
    resolver: &Resolver,
    warnings: &Warnings,
) -> Result<()> {
    // Group in file order so merge semantics follow first occurrence.
    let mut roots: Vec<(String, Vec<&Dependency>)> = Vec::new();
    for dep in entries {
        let root = if dep.repo_url.is_some() {
            dep.import_path.clone()
        } else {
            resolver
                .resolve_root(&dep.import_path)
                .map_err(|source| ManifestError::RootResolution {
                    path: dep.import_path.clone(),
                    source,
                })?
        };
        match roots.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.push(dep),
            None => roots.push((root, vec![dep])),
        }
    }

    let mut suggested = Vec::new();
    let mut dirty = false;
    for (root, group) in &roots {
        if group.len() == 1 {
            let dep = group[0];
            if dep.import_path != *root && !is_versioned(&dep.import_path) {
                warnings.warn(format!(
                    "{} is not a root import, should be {root}",
                    dep.import_path
                ));
                suggested.push(Dependency {
                    import_path: root.clone(),
                    revision: dep.revision.clone(),
                    repo_url: dep.repo_url.clone(),
                });
                dirty = true;
            } else {
                suggested.push(dep.clone());
            }
            continue;
        }

        let declared: Vec<&str> = group.iter().map(|d| d.import_path.as_str()).collect();
        warnings.warn(format!(
            "{root} is declared {} times, subpackages: {}",
            group.len(),
            declared.join(", ")
        ));
        suggested.push(Dependency {
            import_path: root.clone(),
            revision: group[0].revision.clone(),
            repo_url: group
                .iter()
                .find_map(|d| d.repo_url.clone()),
        });
        dirty = true;
    }

    if !dirty {
        return Ok(());
    }

    let suggested_path = manifest_path.with_extension(format!(
        "{}tmp",
        manifest_path
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default()
    ));
    write_file(&suggested_path, &suggested)?;
    info!("suggested config written to {}", suggested_path.display());
    Err(ManifestError::Validation {
        suggested: suggested_path,
    })
}
