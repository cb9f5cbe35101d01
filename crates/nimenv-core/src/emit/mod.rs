//! Generated artifacts.
//!
//! ```text
//! ResolvedDependency[] ──┬──► render_manifest ──► nim.cfg
//!                        └──► ScriptSlots ──► render_script ──► build.sh
//! ```
//!
//! Both files carry the same dependency order so that they stay consistent.

mod manifest;
mod script;

pub use manifest::{render_manifest, write_manifest};
pub use script::{
    RELEASE_FLAG, ScriptSlots, ScriptVariant, build_stanza, deps_stanza, render_script,
    write_script,
};
