//! Project file layout.
//!
//! Every file nimenv reads or writes lives directly in the project root:
//!
//! ```text
//! project/
//! ├── nimenv.cfg   # declared dependencies and build targets (input)
//! ├── nimenv.local # dependency name -> local working copy (input/output)
//! ├── nim.cfg      # compiler search paths (generated)
//! ├── build.sh     # standalone bootstrap script (generated)
//! ├── deps.nix     # reproducible fetch rules (toggle + generated)
//! └── .deps.json   # content hash cache (generated)
//! ```

use std::path::{Path, PathBuf};

/// Project configuration file name.
pub const CONFIG_FILE: &str = "nimenv.cfg";
/// Local repository map file name.
pub const LOCAL_FILE: &str = "nimenv.local";
/// Compiler manifest file name.
pub const MANIFEST_FILE: &str = "nim.cfg";
/// Bootstrap script file name.
pub const SCRIPT_FILE: &str = "build.sh";
/// Reproducible descriptor file name.
pub const DESCRIPTOR_FILE: &str = "deps.nix";
/// Content hash cache file name.
pub const CACHE_FILE: &str = ".deps.json";

/// Paths of all nimenv files for one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// The project root directory.
    pub root: PathBuf,

    /// `nimenv.cfg`
    pub config: PathBuf,

    /// `nimenv.local`
    pub local: PathBuf,

    /// `nim.cfg`
    pub manifest: PathBuf,

    /// `build.sh`
    pub script: PathBuf,

    /// `deps.nix`
    pub descriptor: PathBuf,

    /// `.deps.json`
    pub cache: PathBuf,
}

impl ProjectPaths {
    /// Lay out the project files under `root`. Nothing is created on disk.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            config: root.join(CONFIG_FILE),
            local: root.join(LOCAL_FILE),
            manifest: root.join(MANIFEST_FILE),
            script: root.join(SCRIPT_FILE),
            descriptor: root.join(DESCRIPTOR_FILE),
            cache: root.join(CACHE_FILE),
            root,
        }
    }

    /// Whether the reproducible-descriptor stage is enabled for this project.
    pub fn reproducible(&self) -> bool {
        self.descriptor.exists()
    }

    /// Resolve a working copy path recorded in `nimenv.local`.
    ///
    /// Relative entries are relative to the project root.
    pub fn checkout(&self, recorded: &str) -> PathBuf {
        let path = Path::new(recorded);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = ProjectPaths::new("/work/app");
        assert_eq!(paths.config, PathBuf::from("/work/app/nimenv.cfg"));
        assert_eq!(paths.cache, PathBuf::from("/work/app/.deps.json"));
        assert_eq!(paths.script, PathBuf::from("/work/app/build.sh"));
    }

    #[test]
    fn test_checkout_resolution() {
        let paths = ProjectPaths::new("/work/app");
        assert_eq!(paths.checkout("/repos/foo"), PathBuf::from("/repos/foo"));
        assert_eq!(paths.checkout("../foo"), PathBuf::from("/work/app/../foo"));
    }

    #[test]
    fn test_reproducible_toggle() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let paths = ProjectPaths::new(temp.path());
        assert!(!paths.reproducible());

        fs::write(&paths.descriptor, "").expect("Failed to write deps.nix");
        assert!(paths.reproducible());
    }
}
