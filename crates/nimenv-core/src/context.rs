//! Project context and the `dist` generation pipeline.
//!
//! ```text
//! nimenv.cfg ─┐
//!             ├─► DependencyResolver ─► ResolvedDependency[] ─┬─► nim.cfg
//! nimenv.local┘                                              ├─► build.sh   (unless deps.nix exists)
//!                                                            └─► deps.nix + .deps.json (if deps.nix exists)
//! ```

use std::path::Path;

use crate::config::{LocalRepoMap, ProjectConfig};
use crate::emit::{ScriptSlots, ScriptVariant, render_script, write_manifest, write_script};
use crate::error::Result;
use crate::paths::ProjectPaths;
use crate::repro::{ContentHashFetcher, DescriptorEmitter, ReproCache};
use crate::resolve::{DependencyResolver, ResolvedDependency};
use crate::setup::{SetupReport, local_setup};
use crate::vcs::VcsInspector;

/// Everything one invocation needs about the project, loaded once.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub paths: ProjectPaths,
    pub config: ProjectConfig,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Resolved dependencies, sorted by name.
    pub dependencies: Vec<ResolvedDependency>,

    /// Whether `build.sh` was (re)written.
    pub script_written: bool,

    /// The refreshed hash cache, when the reproducible stage ran.
    pub cache: Option<ReproCache>,
}

impl ProjectContext {
    /// Load `nimenv.cfg` from the project at `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let paths = ProjectPaths::new(root);
        let config = ProjectConfig::load(&paths.config)?;
        Ok(Self { paths, config })
    }

    /// Load `nimenv.local`; it must exist.
    pub fn local_repos(&self) -> Result<LocalRepoMap> {
        LocalRepoMap::load(&self.paths.local)
    }

    /// Resolve every dependency against `nimenv.local` without writing anything.
    pub fn resolve<V: VcsInspector + ?Sized>(&self, vcs: &V) -> Result<Vec<ResolvedDependency>> {
        let repos = self.local_repos()?;
        DependencyResolver::new(&self.paths, vcs).resolve_all(&self.config, &repos)
    }

    /// Regenerate `nim.cfg`, then either `build.sh` or the reproducible descriptor.
    ///
    /// All inputs are resolved and the script is rendered before the first
    /// file is written. `make_fetcher` is only called when `deps.nix` exists.
    /// A fetch failure leaves the freshly written `nim.cfg` in place.
    pub fn generate<V, F, M>(&self, vcs: &V, variant: ScriptVariant, make_fetcher: M) -> Result<Generation>
    where
        V: VcsInspector + ?Sized,
        F: ContentHashFetcher,
        M: FnOnce() -> Result<F>,
    {
        let dependencies = self.resolve(vcs)?;
        let script = render_script(&ScriptSlots::new(&self.config, &dependencies, variant)?)?;

        write_manifest(
            &self.paths.manifest,
            &dependencies,
            &self.config.compiler_extra_config,
        )?;

        if !self.paths.reproducible() {
            write_script(&self.paths.script, &script)?;
            return Ok(Generation {
                dependencies,
                script_written: true,
                cache: None,
            });
        }

        tracing::info!(
            "{} exists, emitting reproducible descriptor instead of {}",
            self.paths.descriptor.display(),
            self.paths.script.display()
        );
        let fetcher = make_fetcher()?;
        let cache = DescriptorEmitter::new(&fetcher).emit(
            &self.paths.cache,
            &self.paths.descriptor,
            &dependencies,
        )?;

        Ok(Generation {
            dependencies,
            script_written: false,
            cache: Some(cache),
        })
    }

    /// Clone missing dependencies under `base_dir` and update `nimenv.local`.
    pub fn local_setup<V: VcsInspector + ?Sized>(&self, base_dir: &Path, vcs: &V) -> Result<SetupReport> {
        local_setup(&self.paths, &self.config, base_dir, vcs)
    }
}
