//! Version-control collaborator.
//!
//! The resolver and local setup only talk to a [`VcsInspector`]; [`GitCli`]
//! is the implementation backed by the `git` binary.

mod git;

use std::path::Path;

use crate::error::Result;

pub use git::GitCli;

/// Operations nimenv needs from a version-control system.
pub trait VcsInspector {
    /// Whether the working copy has unstaged changes, staged changes or untracked files.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool>;

    /// The full commit id checked out in the working copy.
    fn current_revision(&self, path: &Path) -> Result<String>;

    /// Clone `url` into `path`.
    fn clone_repo(&self, url: &str, path: &Path, recursive: bool) -> Result<()>;

    /// Check out `rev` in the working copy.
    fn checkout(&self, path: &Path, rev: &str) -> Result<()>;

    /// Initialize and update submodules to the recorded commits.
    fn update_submodules(&self, path: &Path) -> Result<()>;
}

/// Whether `rev` is a full 40-character hex commit id.
pub fn is_full_revision(rev: &str) -> bool {
    rev.len() == 40 && rev.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_full_revision() {
        assert!(is_full_revision("0123456789abcdef0123456789abcdef01234567"));
        assert!(!is_full_revision("0123456"));
        assert!(!is_full_revision("g123456789abcdef0123456789abcdef01234567"));
    }
}
