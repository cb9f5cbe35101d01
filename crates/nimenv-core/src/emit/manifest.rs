//! Compiler path manifest (`nim.cfg`) generation.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::resolve::ResolvedDependency;

/// Render `nim.cfg`.
///
/// Layout: the project root path, one `path:` line per dependency in the
/// given order, a blank line, then the `[nim]` section body.
pub fn render_manifest(dependencies: &[ResolvedDependency], extra_config: &str) -> String {
    let mut lines = vec![path_line(".")];
    for dep in dependencies {
        lines.push(path_line(&dep.search_path()));
    }
    lines.push(String::new());
    lines.push(format!("{extra_config}\n"));
    lines.join("\n")
}

/// Overwrite `nim.cfg`. The file is never hand-edited.
pub fn write_manifest(
    path: &Path,
    dependencies: &[ResolvedDependency],
    extra_config: &str,
) -> Result<()> {
    fs::write(path, render_manifest(dependencies, extra_config))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn path_line(path: &str) -> String {
    format!("path: \"{path}\"")
}
