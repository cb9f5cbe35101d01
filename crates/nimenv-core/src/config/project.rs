//! Typed views of `nimenv.cfg` and `nimenv.local`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::section::{KvTable, Sections};
use crate::error::{Error, Result};

/// Name of the compiler entry in `[deps]`.
pub const COMPILER_DEP: &str = "nim";

/// Section of `nimenv.local` holding the repository map.
const REPOS_SECTION: &str = "repos";

/// A source dependency declared in `[deps]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,

    /// Clone URL.
    pub url: String,

    /// Path suffix inside the checkout, with a leading `/`, or empty.
    pub suffix: String,
}

impl DependencySpec {
    /// Parse a `url [subpath]` value.
    fn parse(name: &str, value: &str) -> Result<Self> {
        let mut parts = value.splitn(2, char::is_whitespace);
        let url = parts.next().unwrap_or("").trim();
        if url.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "dependency '{name}' has no source URL"
            )));
        }

        let suffix = match parts.next().map(str::trim) {
            Some(sub) if !sub.is_empty() => format!("/{sub}"),
            _ => String::new(),
        };

        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            suffix,
        })
    }
}

/// The pinned compiler tarball from the `nim` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSpec {
    pub url: String,
    /// Hex sha256 of the tarball.
    pub sha256: String,
}

impl CompilerSpec {
    fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(url), Some(sha256), None) => Ok(Self {
                url: url.to_string(),
                sha256: sha256.to_string(),
            }),
            _ => Err(Error::InvalidConfig(format!(
                "'{COMPILER_DEP}' entry must be '<url> <sha256>', found '{value}'"
            ))),
        }
    }
}

/// Contents of `nimenv.cfg`.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub compiler: CompilerSpec,

    /// Non-compiler dependencies, keyed by name.
    pub dependencies: BTreeMap<String, DependencySpec>,

    /// Artifact name -> compiler arguments.
    pub build_targets: BTreeMap<String, String>,

    /// `[nim]` section body, passed through verbatim.
    pub compiler_extra_config: String,
}

impl ProjectConfig {
    /// Load `nimenv.cfg` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigMissing {
                path: path.to_path_buf(),
                hint: "create nimenv.cfg with [deps] and [build] sections",
            });
        }
        let text = fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Parse `nimenv.cfg` text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let sections = Sections::parse(path, text)?;
        let deps = sections.table(path, "deps")?;
        let build = sections.table(path, "build")?;

        let compiler = match deps.get(COMPILER_DEP) {
            Some(value) => CompilerSpec::parse(value)?,
            None => {
                return Err(Error::InvalidConfig(format!(
                    "[deps] has no '{COMPILER_DEP}' entry"
                )));
            }
        };

        let mut dependencies = BTreeMap::new();
        for (name, value) in deps.iter().filter(|(name, _)| *name != COMPILER_DEP) {
            dependencies.insert(name.to_string(), DependencySpec::parse(name, value)?);
        }

        let mut build_targets = BTreeMap::new();
        for (name, args) in build.iter() {
            validate_target_name(name)?;
            build_targets.insert(name.to_string(), args.to_string());
        }

        Ok(Self {
            compiler,
            dependencies,
            build_targets,
            compiler_extra_config: sections.body("nim").to_string(),
        })
    }
}

/// Target names become `bin/<name>` inside the generated script.
fn validate_target_name(name: &str) -> Result<()> {
    let valid = !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "build target '{name}' is not a plain file name"
        )))
    }
}

/// Contents of `nimenv.local`: dependency name -> working copy path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalRepoMap {
    repos: KvTable,
}

impl LocalRepoMap {
    /// Load `nimenv.local`, failing with [`Error::ConfigMissing`] if absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigMissing {
                path: path.to_path_buf(),
                hint: "run `nimenv localsetup <basedir>` first",
            });
        }
        let text = fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Load `nimenv.local`, or start an empty map if it does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let sections = Sections::parse(path, text)?;
        Ok(Self {
            repos: sections.table(path, REPOS_SECTION)?,
        })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.repos.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.repos.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.repos.insert(name, path);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.repos.iter()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Render the file, entries sorted by name.
    pub fn render(&self) -> String {
        format!("[{REPOS_SECTION}]\n{}", self.repos.to_body())
    }

    /// Overwrite `nimenv.local`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        tracing::info!("Wrote {} ({} repos)", path.display(), self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: &str = "\
[deps]
nim: https://nim-lang.org/download/nim-1.6.0.tar.xz 52065d48d72a72702ec1afe5f7a9831e6a4ff4f4ed3bd9c8b9b04a4b6c1e0b8b
zlib: https://example/zlib.git src # wrapper lives in src
foo: https://example/foo.git

[build]
app: main.nim
tool: -d:ssl tools/tool.nim

[nim]
--threads:on
";

    fn path() -> &'static Path {
        Path::new("nimenv.cfg")
    }

    #[test]
    fn test_parse_project_config() {
        let config = ProjectConfig::parse(path(), CFG).unwrap();

        assert_eq!(config.compiler.url, "https://nim-lang.org/download/nim-1.6.0.tar.xz");
        assert_eq!(config.compiler.sha256.len(), 64);

        let names: Vec<_> = config.dependencies.keys().cloned().collect();
        assert_eq!(names, vec!["foo", "zlib"]);
        assert_eq!(config.dependencies["zlib"].suffix, "/src");
        assert_eq!(config.dependencies["foo"].suffix, "");
        assert_eq!(config.dependencies["foo"].url, "https://example/foo.git");

        assert_eq!(config.build_targets["tool"], "-d:ssl tools/tool.nim");
        assert_eq!(config.compiler_extra_config, "--threads:on");
    }

    #[test]
    fn test_missing_compiler_entry() {
        let err = ProjectConfig::parse(path(), "[deps]\nfoo: https://x\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_compiler_entry_needs_checksum() {
        let err = ProjectConfig::parse(path(), "[deps]\nnim: https://x/nim.tar.xz\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_nim_section_is_empty() {
        let config = ProjectConfig::parse(path(), "[deps]\nnim: u h\n").unwrap();
        assert_eq!(config.compiler_extra_config, "");
        assert!(config.build_targets.is_empty());
    }

    #[test]
    fn test_rejects_bad_target_name() {
        let err = ProjectConfig::parse(path(), "[deps]\nnim: u h\n[build]\n../evil: x.nim\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_local_map_render_sorted() {
        let mut map = LocalRepoMap::default();
        map.insert("zlib", "/repos/zlib");
        map.insert("foo", "/repos/foo");

        assert_eq!(map.render(), "[repos]\nfoo: /repos/foo\nzlib: /repos/zlib\n");

        let reparsed = LocalRepoMap::parse(Path::new("nimenv.local"), &map.render()).unwrap();
        assert_eq!(reparsed, map);
    }

    #[test]
    fn test_local_map_missing_file() {
        let err = LocalRepoMap::load(Path::new("/nonexistent/nimenv.local")).unwrap_err();
        assert!(err.with_hint().contains("localsetup"));

        let empty = LocalRepoMap::load_or_default(Path::new("/nonexistent/nimenv.local")).unwrap();
        assert!(empty.is_empty());
    }
}
