//! Reproducible-build descriptors.
//!
//! Enabled only when the project already contains a `deps.nix`. Each resolved
//! dependency becomes a content-addressed `fetchgit` rule; content hashes are
//! memoized in `.deps.json` keyed by revision.

mod cache;
mod descriptor;
mod fetcher;

pub use cache::{CacheEntry, ReproCache};
pub use descriptor::{DescriptorEmitter, FetchRule, render_descriptor};
pub use fetcher::{ContentHashFetcher, NixPrefetchGit, parse_prefetch_output};
