//! Core engine for nimenv.
//!
//! nimenv pins a Nim compiler tarball and a set of git dependencies to exact
//! revisions and generates:
//! - `nim.cfg`, the compiler search paths pointing at local working copies
//! - `build.sh`, a standalone script that fetches everything and builds
//! - `deps.nix` and `.deps.json`, content-addressed fetch rules (opt-in)
//!
//! Version control and content hashing are reached only through the
//! [`VcsInspector`] and [`ContentHashFetcher`] traits.

pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod paths;
pub mod repro;
pub mod resolve;
pub mod setup;
pub mod vcs;

pub use config::{CompilerSpec, DependencySpec, LocalRepoMap, ProjectConfig};
pub use context::{Generation, ProjectContext};
pub use emit::{ScriptSlots, ScriptVariant};
pub use error::{Error, Result};
pub use paths::ProjectPaths;
pub use repro::{ContentHashFetcher, DescriptorEmitter, NixPrefetchGit, ReproCache};
pub use resolve::{DependencyResolver, ResolvedDependency};
pub use setup::{SetupReport, local_setup};
pub use vcs::{GitCli, VcsInspector};
