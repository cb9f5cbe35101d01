//! Configuration files.
//!
//! ```text
//! nimenv.cfg ──► Sections ──► KvTable ──► ProjectConfig
//! nimenv.local ─► Sections ──► KvTable ──► LocalRepoMap
//! ```

mod project;
mod section;

pub use project::{COMPILER_DEP, CompilerSpec, DependencySpec, LocalRepoMap, ProjectConfig};
pub use section::{KvTable, Section, Sections};
