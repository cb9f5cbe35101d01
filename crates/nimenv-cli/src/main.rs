//! nimenv CLI - pinned Nim build environments.

mod colors;
mod dist;
mod localsetup;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nimenv")]
#[command(about = "Pin a Nim compiler and git dependencies, and generate build files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project directory containing nimenv.cfg
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate nim.cfg and build.sh (or deps.nix) from local working copies (default)
    Dist {
        /// Omit the release flag from build lines
        #[arg(long)]
        dev: bool,
    },

    /// Clone missing dependencies under a base directory and record them in nimenv.local
    Localsetup {
        /// Directory to clone dependencies into
        basedir: PathBuf,
    },

    /// Show the revision each dependency would be pinned to
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format nimenv-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<nimenv_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command.unwrap_or(Commands::Dist { dev: false }) {
        Commands::Dist { dev } => dist::execute(&cli.project_dir, dev).map_err(format_error)?,

        Commands::Localsetup { basedir } => {
            localsetup::execute(&cli.project_dir, &basedir).map_err(format_error)?;
        }

        Commands::Status => status::execute(&cli.project_dir).map_err(format_error)?,
    }

    Ok(())
}
