//! Dist command implementation for nimenv CLI.
//!
//! Regenerates `nim.cfg` plus either `build.sh` or the reproducible descriptor.

use std::path::Path;

use nimenv_core::{GitCli, NixPrefetchGit, ProjectContext, ScriptVariant};

use crate::colors;

/// Execute the dist command.
pub fn execute(project_dir: &Path, dev: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(project_dir)?;
    // Report a missing nimenv.local before a missing git.
    ctx.local_repos()?;
    let git = GitCli::new()?;
    let variant = if dev {
        ScriptVariant::Development
    } else {
        ScriptVariant::Distribution
    };

    let generation = ctx.generate(&git, variant, NixPrefetchGit::new)?;

    println!(
        "{}Pinned{} {} dependencies",
        colors::BOLD,
        colors::RESET,
        generation.dependencies.len()
    );
    for dep in &generation.dependencies {
        let marker = if dep.dirty {
            format!(" {}(uncommitted changes){}", colors::YELLOW, colors::RESET)
        } else {
            String::new()
        };
        println!(
            "  {}◆{} {} {}{}{}{}",
            colors::CYAN,
            colors::RESET,
            dep.name,
            colors::DIM,
            dep.short_revision(),
            colors::RESET,
            marker
        );
    }

    println!(
        "{}✓{} wrote {}",
        colors::GREEN,
        colors::RESET,
        ctx.paths.manifest.display()
    );
    if generation.script_written {
        println!(
            "{}✓{} wrote {}",
            colors::GREEN,
            colors::RESET,
            ctx.paths.script.display()
        );
    }
    if generation.cache.is_some() {
        println!(
            "{}✓{} wrote {} and {}",
            colors::GREEN,
            colors::RESET,
            ctx.paths.descriptor.display(),
            ctx.paths.cache.display()
        );
    }

    Ok(())
}
