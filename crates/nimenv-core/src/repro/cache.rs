//! Content hash cache (`.deps.json`).
//!
//! Remembers the content hash computed for each dependency revision so that
//! unchanged dependencies are not re-fetched.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cached hash for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Revision the hash was computed for.
    pub rev: String,

    /// Content hash of the tree at `rev`.
    pub sha256: String,
}

/// Dependency name -> cached hash. Keys serialize in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReproCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl ReproCache {
    /// Load the cache, starting empty if the file is missing or unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable {} ({}); all hashes will be re-fetched",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Cached hash for `name`, only if it was computed for `rev`.
    pub fn lookup(&self, name: &str, rev: &str) -> Option<&str> {
        self.entries
            .get(name)
            .filter(|entry| entry.rev == rev)
            .map(|entry| entry.sha256.as_str())
    }

    /// Last recorded revision for `name`, regardless of freshness.
    pub fn recorded_rev(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.rev.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, rev: impl Into<String>, sha256: impl Into<String>) {
        self.entries.insert(
            name.into(),
            CacheEntry {
                rev: rev.into(),
                sha256: sha256.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Overwrite the cache file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        tracing::info!("Wrote {} ({} entries)", path.display(), self.len());
        Ok(())
    }
}
