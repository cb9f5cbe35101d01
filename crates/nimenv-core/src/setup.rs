//! Local setup: clone missing dependencies and record them in `nimenv.local`.

use std::fs;
use std::path::Path;

use crate::config::{LocalRepoMap, ProjectConfig};
use crate::error::{Error, Result};
use crate::paths::ProjectPaths;
use crate::repro::ReproCache;
use crate::vcs::VcsInspector;

/// What a local setup run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Dependencies cloned during this run.
    pub cloned: Vec<String>,

    /// Dependencies whose target directory already existed and was adopted as-is.
    pub adopted: Vec<String>,

    /// Dependencies already present in `nimenv.local`.
    pub skipped: Vec<String>,
}

/// Make sure every declared dependency has a local working copy under `base_dir`.
///
/// Existing `nimenv.local` entries are kept untouched. For each missing entry
/// the dependency is cloned into `base_dir/<name>` unless that path already
/// exists. Freshly cloned copies are checked out at the revision recorded in
/// `.deps.json`, if any. `nimenv.local` is rewritten, sorted by name.
pub fn local_setup<V: VcsInspector + ?Sized>(
    paths: &ProjectPaths,
    config: &ProjectConfig,
    base_dir: &Path,
    vcs: &V,
) -> Result<SetupReport> {
    // `#` starts a comment in nimenv.local, so such a path would not read back.
    let base = base_dir.to_string_lossy();
    if base.contains('#') || base.contains('\n') {
        return Err(Error::InvalidConfig(format!(
            "base directory '{base}' cannot be recorded in nimenv.local"
        )));
    }

    let mut repos = LocalRepoMap::load_or_default(&paths.local)?;
    let pins = ReproCache::load(&paths.cache)?;
    let mut report = SetupReport::default();

    for (name, spec) in &config.dependencies {
        if repos.contains(name) {
            report.skipped.push(name.clone());
            continue;
        }

        let recorded = base_dir.join(name);
        let target = paths.checkout(&recorded.to_string_lossy());

        if target.exists() {
            tracing::info!("Using existing working copy {}", target.display());
            report.adopted.push(name.clone());
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            vcs.clone_repo(&spec.url, &target, true)?;
            if let Some(rev) = pins.recorded_rev(name) {
                tracing::info!("Checking out pinned revision {} of {}", rev, name);
                vcs.checkout(&target, rev)?;
                vcs.update_submodules(&target)?;
            }
            report.cloned.push(name.clone());
        }

        repos.insert(name.clone(), recorded.to_string_lossy().into_owned());
    }

    repos.save(&paths.local)?;
    Ok(report)
}
