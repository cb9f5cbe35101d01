//! Reproducible fetch descriptor (`deps.nix`) generation.

use std::fs;
use std::path::Path;

use super::cache::ReproCache;
use super::fetcher::ContentHashFetcher;
use crate::error::{Error, Result};
use crate::resolve::ResolvedDependency;

/// A content-addressed fetch rule for one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRule {
    pub name: String,
    pub url: String,
    pub rev: String,
    pub fetch_submodules: bool,
    pub sha256: String,
}

/// Computes fetch rules, reusing cached hashes where the revision is unchanged.
pub struct DescriptorEmitter<'a, F: ContentHashFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: ContentHashFetcher + ?Sized> DescriptorEmitter<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Build one rule per dependency and the cache that should replace `previous`.
    ///
    /// The fetcher is called only for dependencies whose cached revision is
    /// missing or stale. Entries for dependencies no longer declared are dropped.
    pub fn rules(
        &self,
        dependencies: &[ResolvedDependency],
        previous: &ReproCache,
    ) -> Result<(Vec<FetchRule>, ReproCache)> {
        let mut cache = ReproCache::default();
        let mut rules = Vec::with_capacity(dependencies.len());

        for dep in dependencies {
            let sha256 = match previous.lookup(&dep.name, &dep.revision) {
                Some(hash) => {
                    tracing::debug!("Reusing cached hash for {} at {}", dep.name, dep.revision);
                    hash.to_string()
                }
                None => {
                    tracing::info!("Fetching content hash for {} at {}", dep.name, dep.revision);
                    self.fetcher
                        .fetch(&dep.url, &dep.revision, true)
                        .map_err(|e| match e {
                            Error::Fetch { message, .. } => Error::Fetch {
                                name: dep.name.clone(),
                                message,
                            },
                            other => other,
                        })?
                }
            };

            cache.insert(dep.name.clone(), dep.revision.clone(), sha256.clone());
            rules.push(FetchRule {
                name: dep.name.clone(),
                url: dep.url.clone(),
                rev: dep.revision.clone(),
                fetch_submodules: true,
                sha256,
            });
        }

        Ok((rules, cache))
    }

    /// Refresh `.deps.json` and `deps.nix`.
    pub fn emit(
        &self,
        cache_path: &Path,
        descriptor_path: &Path,
        dependencies: &[ResolvedDependency],
    ) -> Result<ReproCache> {
        let previous = ReproCache::load(cache_path)?;
        let (rules, cache) = self.rules(dependencies, &previous)?;

        cache.save(cache_path)?;
        fs::write(descriptor_path, render_descriptor(&rules))?;
        tracing::info!("Wrote {} ({} rules)", descriptor_path.display(), rules.len());

        Ok(cache)
    }
}

/// Render `deps.nix`: a function of `fetchgit` returning one attribute per dependency.
pub fn render_descriptor(rules: &[FetchRule]) -> String {
    let mut out = String::from(
        "# Generated by nimenv. Do not edit; run `nimenv dist` to regenerate.\n{ fetchgit }:\n{\n",
    );

    for rule in rules {
        out.push_str(&format!("  {} = fetchgit {{\n", nix_attr(&rule.name)));
        out.push_str(&format!("    url = {};\n", nix_string(&rule.url)));
        out.push_str(&format!("    rev = {};\n", nix_string(&rule.rev)));
        out.push_str(&format!("    fetchSubmodules = {};\n", rule.fetch_submodules));
        out.push_str(&format!("    sha256 = {};\n", nix_string(&rule.sha256)));
        out.push_str("  };\n");
    }

    out.push_str("}\n");
    out
}

fn nix_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{escaped}\"")
}

/// Bare identifier when valid, quoted otherwise.
fn nix_attr(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\''));
    if bare { name.to_string() } else { nix_string(name) }
}
