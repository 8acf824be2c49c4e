//! Bounded-parallel fetch orchestration.

use crate::error::{FetchError, Result};
use crate::fetch::{WorkingCopy, fetch_dependency};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::Path;
use stowage_manifest::Dependency;
use stowage_resolver::{Resolver, SecurityMode};
use tracing::info;

/// Default number of concurrent fetches. Each worker drives at most one VCS
/// subprocess, so this also bounds in-flight subprocesses.
pub const DEFAULT_MAX_PARALLEL: usize = 16;

/// Executor for fetching many dependencies at once.
#[derive(Debug, Clone, Copy)]
pub struct FetchPool {
    max_parallel: usize,
}

impl Default for FetchPool {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchPool {
    /// Pool with the default concurrency.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    /// Override the concurrency bound.
    #[must_use]
    pub const fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max;
        self
    }

    /// Fetch every entry; scheduling follows the given order, completion
    /// order is unspecified. All entries are attempted; when any fail the
    /// result is a single [`FetchError::Aggregate`] carrying every report.
    pub fn fetch_all(
        &self,
        vendor_dir: &Path,
        deps: &[Dependency],
        resolver: &Resolver,
        security: SecurityMode,
    ) -> Result<Vec<WorkingCopy>> {
        info!(count = deps.len(), max_parallel = self.max_parallel, "fetching dependencies");

        let fetched = Mutex::new(Vec::with_capacity(deps.len()));
        let failures = Mutex::new(Vec::new());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel)
            .build()
            .map_err(|err| FetchError::Pool {
                message: err.to_string(),
            })?;

        pool.install(|| {
            deps.par_iter().for_each(|dep| {
                info!("\tclone {} {}", dep.import_path, dep.revision);
                match fetch_dependency(vendor_dir, dep, resolver, security) {
                    Ok(copy) => fetched.lock().push(copy),
                    Err(err) => failures.lock().push(format!("{}: {err}", dep.import_path)),
                }
                info!("\tfinished clone {}", dep.import_path);
            });
        });

        let mut reports = failures.into_inner();
        if reports.is_empty() {
            let mut copies = fetched.into_inner();
            copies.sort_by(|a, b| a.import_root.cmp(&b.import_root));
            Ok(copies)
        } else {
            reports.sort();
            Err(FetchError::Aggregate { reports })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_failures_are_reported() {
        // Unresolvable entries: bad site, malformed github path. No network
        // is touched for either.
        let temp = tempfile::tempdir().unwrap();
        let deps = vec![
            Dependency::new("github.com/lonely", "abc123"),
            Dependency::new("https://github.com/user/repo", "def456"),
        ];
        let resolver = Resolver::new().unwrap();
        let err = FetchPool::new()
            .fetch_all(temp.path(), &deps, &resolver, SecurityMode::Secure)
            .unwrap_err();
        match err {
            FetchError::Aggregate { reports } => {
                assert_eq!(reports.len(), 2);
                assert!(reports.iter().all(|r| r.contains(':')));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_a_clean_success() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new().unwrap();
        let copies = FetchPool::new()
            .fetch_all(temp.path(), &[], &resolver, SecurityMode::Secure)
            .unwrap();
        assert!(copies.is_empty());
    }
}
