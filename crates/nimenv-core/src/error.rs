//! Error types for nimenv-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for nimenv-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nimenv-core.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input file does not exist.
    #[error("{} not found", path.display())]
    ConfigMissing {
        path: PathBuf,
        /// Recovery instruction shown by [`Error::with_hint`].
        hint: &'static str,
    },

    /// Malformed section header or key/value line.
    #[error("parse error in {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        /// 1-based line number within the file.
        line: usize,
        message: String,
    },

    /// Well-formed configuration with an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dependency declared in `[deps]` but absent from `nimenv.local`.
    #[error("dependency '{name}' has no entry in nimenv.local")]
    MissingRepo { name: String },

    /// A version-control command failed.
    #[error("git error in {}: {message}", path.display())]
    Vcs { path: PathBuf, message: String },

    /// The content-hash fetcher failed or returned garbage.
    #[error("failed to fetch content hash for '{name}': {message}")]
    Fetch { name: String, message: String },

    /// Script template drifted from its slot schema.
    #[error("template error: {0}")]
    Template(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Render the error together with a recovery hint, if one applies.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::ConfigMissing { hint, .. } => Some(*hint),
            Error::MissingRepo { .. } => {
                Some("run `nimenv localsetup <basedir>` to clone missing dependencies")
            }
            Error::Fetch { .. } => {
                Some("check that nix-prefetch-git is installed and the revision is pushed")
            }
            Error::Template(_) => Some("this is a bug in nimenv, please report it"),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_repo_hint() {
        let err = Error::MissingRepo {
            name: "foo".to_string(),
        };
        let rendered = err.with_hint();
        assert!(rendered.starts_with("dependency 'foo' has no entry in nimenv.local"));
        assert!(rendered.contains("nimenv localsetup"));
    }

    #[test]
    fn test_no_hint_for_io() {
        let err = Error::Io(std::io::Error::other("boom"));
        assert_eq!(err.with_hint(), "IO error: boom");
    }
}
