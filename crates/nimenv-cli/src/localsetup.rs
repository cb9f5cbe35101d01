//! Localsetup command implementation for nimenv CLI.

use std::path::Path;

use nimenv_core::{GitCli, ProjectContext};

use crate::colors;

/// Clone missing dependencies under `base_dir` and record them in `nimenv.local`.
pub fn execute(project_dir: &Path, base_dir: &Path) -> anyhow::Result<()> {
    let ctx = ProjectContext::load(project_dir)?;
    let git = GitCli::new()?;

    let report = ctx.local_setup(base_dir, &git)?;

    for name in &report.cloned {
        println!("  {}cloned{}   {}", colors::GREEN, colors::RESET, name);
    }
    for name in &report.adopted {
        println!("  {}existing{} {}", colors::CYAN, colors::RESET, name);
    }
    for name in &report.skipped {
        println!("  {}kept{}     {}", colors::DIM, colors::RESET, name);
    }

    println!(
        "{}✓{} wrote {}",
        colors::GREEN,
        colors::RESET,
        ctx.paths.local.display()
    );

    Ok(())
}
