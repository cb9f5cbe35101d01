//! Content-hash fetcher collaborator.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Turns a repository URL and revision into a content hash.
pub trait ContentHashFetcher {
    /// Fetch `url` at `rev` and return its sha256 content hash.
    fn fetch(&self, url: &str, rev: &str, submodules: bool) -> Result<String>;
}

/// Response printed by `nix-prefetch-git`. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct PrefetchResponse {
    sha256: String,
}

/// Parse the fetcher's JSON output.
pub fn parse_prefetch_output(stdout: &str) -> std::result::Result<String, String> {
    let response: PrefetchResponse =
        serde_json::from_str(stdout).map_err(|e| format!("unparsable fetcher output: {e}"))?;
    let sha256 = response.sha256.trim();
    if sha256.is_empty() {
        return Err("fetcher returned an empty sha256".to_string());
    }
    Ok(sha256.to_string())
}

/// Runs `nix-prefetch-git`.
#[derive(Debug, Clone)]
pub struct NixPrefetchGit {
    program: PathBuf,
}

impl NixPrefetchGit {
    /// Locate `nix-prefetch-git` in `PATH`.
    pub fn new() -> Result<Self> {
        let program = which::which("nix-prefetch-git").map_err(|_| Error::Fetch {
            name: "nix-prefetch-git".to_string(),
            message: "nix-prefetch-git not found in PATH".to_string(),
        })?;
        Ok(Self { program })
    }

    /// Use a specific fetcher binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ContentHashFetcher for NixPrefetchGit {
    fn fetch(&self, url: &str, rev: &str, submodules: bool) -> Result<String> {
        let fail = |message: String| Error::Fetch {
            name: url.to_string(),
            message,
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(["--quiet", "--url", url, "--rev", rev]);
        if submodules {
            cmd.arg("--fetch-submodules");
        }

        tracing::debug!("{} --url {} --rev {}", self.program.display(), url, rev);

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| fail(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        parse_prefetch_output(&String::from_utf8_lossy(&output.stdout)).map_err(fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefetch_output() {
        let stdout = r#"{
  "url": "https://example/foo.git",
  "rev": "0123456789abcdef0123456789abcdef01234567",
  "date": "2021-01-01T00:00:00+00:00",
  "path": "/nix/store/abc-foo",
  "sha256": "0ssi1wpaf7plaswqqjwigppsg5fyh99vdlb9kzl7c9lng89ndq1i",
  "fetchLFS": false,
  "fetchSubmodules": true,
  "deepClone": false,
  "leaveDotGit": false
}"#;
        assert_eq!(
            parse_prefetch_output(stdout).unwrap(),
            "0ssi1wpaf7plaswqqjwigppsg5fyh99vdlb9kzl7c9lng89ndq1i"
        );
    }

    #[test]
    fn test_parse_prefetch_garbage() {
        assert!(parse_prefetch_output("error: repository not found").is_err());
        assert!(parse_prefetch_output(r#"{"url": "x"}"#).is_err());
        assert!(parse_prefetch_output(r#"{"sha256": " "}"#).is_err());
    }

    #[test]
    fn test_missing_program_is_fetch_error() {
        let fetcher = NixPrefetchGit::with_program("/nonexistent/nix-prefetch-git");
        let err = fetcher.fetch("https://example/foo.git", "abc", true).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
