//! `git` command-line backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use super::{VcsInspector, is_full_revision};
use crate::error::{Error, Result};

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_path: PathBuf,
}

impl GitCli {
    /// Locate `git` in `PATH`.
    pub fn new() -> Result<Self> {
        let git_path = which::which("git").map_err(|_| Error::Vcs {
            path: PathBuf::from("."),
            message: "git not found in PATH".to_string(),
        })?;
        Ok(Self { git_path })
    }

    /// Use a specific `git` binary.
    pub fn with_path(git_path: impl Into<PathBuf>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }

    /// Run git in `cwd`, capturing output. Only spawn failures are errors.
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
        tracing::debug!("git {} (in {})", args.join(" "), cwd.display());

        Command::new(&self.git_path)
            .current_dir(cwd)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Vcs {
                path: cwd.to_path_buf(),
                message: format!("failed to run git: {e}"),
            })
    }

    /// Run git and require a zero exit status.
    fn run_checked(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
        let output = self.run(cwd, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Vcs {
                path: cwd.to_path_buf(),
                message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
            });
        }
        Ok(output)
    }

    /// Run a `git diff --exit-code` style command: 0 is clean, 1 means differences.
    fn differs(&self, cwd: &Path, args: &[&str]) -> Result<bool> {
        let output = self.run(cwd, args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::Vcs {
                path: cwd.to_path_buf(),
                message: format!(
                    "git {} failed: {}",
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }),
        }
    }
}

impl VcsInspector for GitCli {
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool> {
        if self.differs(path, &["diff", "--quiet", "--exit-code"])? {
            return Ok(true);
        }
        if self.differs(path, &["diff", "--cached", "--quiet", "--exit-code"])? {
            return Ok(true);
        }

        let untracked = self.run_checked(
            path,
            &["ls-files", "--others", "--exclude-standard", "--directory"],
        )?;
        Ok(!untracked.stdout.iter().all(u8::is_ascii_whitespace))
    }

    fn current_revision(&self, path: &Path) -> Result<String> {
        let output = self.run_checked(path, &["rev-parse", "HEAD"])?;
        let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !is_full_revision(&rev) {
            return Err(Error::Vcs {
                path: path.to_path_buf(),
                message: format!("unexpected output from git rev-parse: '{rev}'"),
            });
        }
        Ok(rev)
    }

    fn clone_repo(&self, url: &str, path: &Path, recursive: bool) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let target = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Vcs {
                path: path.to_path_buf(),
                message: "clone target has no directory name".to_string(),
            })?;

        let mut args = vec!["clone"];
        if recursive {
            args.push("--recursive");
        }
        args.push(url);
        args.push(&target);

        tracing::info!("Cloning {} into {}", url, path.display());
        self.run_checked(parent, &args)?;
        Ok(())
    }

    fn checkout(&self, path: &Path, rev: &str) -> Result<()> {
        self.run_checked(path, &["checkout", "-q", rev])?;
        Ok(())
    }

    fn update_submodules(&self, path: &Path) -> Result<()> {
        self.run_checked(path, &["submodule", "update", "--init", "--recursive"])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_vcs_error() {
        let git = GitCli::with_path("/nonexistent/bin/git");
        let err = git.current_revision(Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::Vcs { .. }));
    }
}
