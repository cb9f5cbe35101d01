//! Dependency resolution.
//!
//! Maps each declared dependency to its local working copy and pins it to the
//! commit currently checked out there.

use std::path::PathBuf;

use crate::config::{DependencySpec, LocalRepoMap, ProjectConfig};
use crate::error::{Error, Result};
use crate::paths::ProjectPaths;
use crate::vcs::VcsInspector;

/// A dependency pinned to an exact revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,

    pub url: String,

    /// 40-hex commit id.
    pub revision: String,

    /// Working copy path exactly as recorded in `nimenv.local`.
    pub local_path: String,

    /// Path suffix with leading `/`, or empty.
    pub suffix: String,

    /// The working copy had uncommitted or untracked files at resolution time.
    pub dirty: bool,
}

impl ResolvedDependency {
    /// Compiler search path for this dependency.
    pub fn search_path(&self) -> String {
        format!("{}{}", self.local_path, self.suffix)
    }

    /// Abbreviated revision for display.
    pub fn short_revision(&self) -> &str {
        self.revision.get(..12).unwrap_or(&self.revision)
    }
}

/// Resolves declared dependencies against their local working copies.
pub struct DependencyResolver<'a, V: VcsInspector + ?Sized> {
    paths: &'a ProjectPaths,
    vcs: &'a V,
}

impl<'a, V: VcsInspector + ?Sized> DependencyResolver<'a, V> {
    pub fn new(paths: &'a ProjectPaths, vcs: &'a V) -> Self {
        Self { paths, vcs }
    }

    /// Resolve every non-compiler dependency, sorted by name.
    ///
    /// Fails with [`Error::MissingRepo`] before any VCS call if a dependency
    /// has no `nimenv.local` entry. A dirty working copy only produces a warning.
    pub fn resolve_all(
        &self,
        config: &ProjectConfig,
        repos: &LocalRepoMap,
    ) -> Result<Vec<ResolvedDependency>> {
        if let Some(missing) = config.dependencies.keys().find(|name| !repos.contains(name)) {
            return Err(Error::MissingRepo {
                name: missing.clone(),
            });
        }

        // BTreeMap iteration gives lexicographic order.
        config
            .dependencies
            .values()
            .map(|spec| {
                let local_path = repos.get(&spec.name).unwrap_or_default();
                self.resolve(spec, local_path)
            })
            .collect()
    }

    /// Resolve a single dependency checked out at `local_path`.
    pub fn resolve(&self, spec: &DependencySpec, local_path: &str) -> Result<ResolvedDependency> {
        let checkout: PathBuf = self.paths.checkout(local_path);

        let dirty = self.vcs.has_uncommitted_changes(&checkout)?;
        if dirty {
            tracing::warn!(
                "There are uncommitted files in {} ({}); the pinned revision may not reproduce this build",
                checkout.display(),
                spec.name
            );
        }

        let revision = self.vcs.current_revision(&checkout)?;
        tracing::debug!("Resolved {} to {}", spec.name, revision);

        Ok(ResolvedDependency {
            name: spec.name.clone(),
            url: spec.url.clone(),
            revision,
            local_path: local_path.to_string(),
            suffix: spec.suffix.clone(),
            dirty,
        })
    }
}
