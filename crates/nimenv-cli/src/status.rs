//! Status command implementation for nimenv CLI.
//!
//! Resolves dependencies like `dist` does, but only prints the result.

use std::path::Path;

use nimenv_core::{GitCli, ProjectContext};

use crate::colors;

/// Print name, revision, search path and cleanliness of every dependency.
pub fn execute(project_dir: &Path) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(project_dir)?;
    // Report a missing nimenv.local before a missing git.
    ctx.local_repos()?;
    let git = GitCli::new()?;

    let dependencies = ctx.resolve(&git)?;

    println!(
        "{}nim{} {} {}(sha256 {}){}",
        colors::BOLD,
        colors::RESET,
        ctx.config.compiler.url,
        colors::DIM,
        ctx.config.compiler.sha256,
        colors::RESET
    );

    if dependencies.is_empty() {
        println!("No dependencies declared in {}", ctx.paths.config.display());
        return Ok(());
    }

    let width = dependencies.iter().map(|d| d.name.len()).max().unwrap_or(0);
    for dep in &dependencies {
        let state = if dep.dirty {
            format!("{}dirty{}", colors::YELLOW, colors::RESET)
        } else {
            format!("{}clean{}", colors::GREEN, colors::RESET)
        };
        println!(
            "{:width$}  {}  {}  {}",
            dep.name,
            dep.revision,
            state,
            dep.search_path(),
            width = width
        );
    }

    Ok(())
}
