//! Bootstrap script (`build.sh`) generation.
//!
//! The script is self-contained: on a machine that never ran nimenv it
//! downloads and verifies the pinned compiler, clones every dependency at its
//! pinned revision, writes its own `nim.cfg` and builds all targets.
//!
//! The template has five named slots (`@@nimurl`, `@@nimhash`, `@@nimcfg`,
//! `@@deps`, `@@build`). [`ScriptSlots`] must provide all of them, and
//! [`render_script`] rejects a template that references an unknown slot or
//! leaves one unused.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::resolve::ResolvedDependency;

/// Slot names the template must reference.
const SLOT_NAMES: [&str; 5] = ["nimurl", "nimhash", "nimcfg", "deps", "build"];

/// Placeholder prefix.
const DELIMITER: &str = "@@";

/// Compiler flag added to every build line of distribution scripts.
pub const RELEASE_FLAG: &str = "-d:release";

const TEMPLATE: &str = r#"#!/bin/sh
# Generated by nimenv. Do not edit; run `nimenv dist` to regenerate.
set -e
cd "$(dirname "$0")"

if [ -e nimenv.local ]; then
  echo 'nimenv.local exists. You may run `nimenv dist` to use your local working copies instead.'
fi

mkdir -p .nimenv/nim
mkdir -p .nimenv/deps

NIMURL=@@nimurl
NIMHASH=@@nimhash
if ! [ -e .nimenv/nimhash ] || ! [ "$(cat .nimenv/nimhash)" = "$NIMHASH" ]; then
  echo "Downloading Nim $NIMURL (sha256: $NIMHASH)"
  wget "$NIMURL" -O .nimenv/nim.tar.xz
  if ! [ "$(sha256sum < .nimenv/nim.tar.xz)" = "$NIMHASH  -" ]; then
    echo "verification failed"
    exit 1
  fi
  echo "Unpacking Nim..."
  rm -r .nimenv/nim
  mkdir -p .nimenv/nim
  (
    cd .nimenv/nim
    tar xJf ../nim.tar.xz
    mv nim-*/* .
    echo "Building Nim..."
    make -j"$(getconf _NPROCESSORS_ONLN)"
  )
  echo "$NIMHASH" > .nimenv/nimhash
fi

get_dep() {
  name="$1"
  url="$2"
  hash="$3"
  srcpath="$4"
  (
    set -e
    cd .nimenv/deps
    if ! [ -e "$name" ]; then
      git clone --recursive "$url" "$name"
    fi
    if ! [ "$(cd "$name" && git rev-parse HEAD)" = "$hash" ]; then
      cd "$name"
      git fetch --all
      git checkout -q "$hash"
      git submodule update --init --recursive
    fi
  )
  echo "path: \".nimenv/deps/$name$srcpath\"" >> nim.cfg
}

echo "path: \".\"" > nim.cfg

@@deps

echo >> nim.cfg
printf '%s\n' @@nimcfg >> nim.cfg

mkdir -p bin
ln -sf ../.nimenv/nim/bin/nim bin/nim

@@build
"#;

/// Which kind of build lines to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptVariant {
    /// Plain compiler invocations.
    Development,
    /// Optimized builds for distribution.
    #[default]
    Distribution,
}

/// Values for every template slot, already shell-quoted where needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSlots {
    pub nim_url: String,
    pub nim_hash: String,
    pub nim_cfg: String,
    pub deps: String,
    pub build: String,
}

impl ScriptSlots {
    /// Fill the slots from the project config and resolved dependencies.
    pub fn new(
        config: &ProjectConfig,
        dependencies: &[ResolvedDependency],
        variant: ScriptVariant,
    ) -> Result<Self> {
        Ok(Self {
            nim_url: quote(&config.compiler.url)?,
            nim_hash: quote(&config.compiler.sha256)?,
            nim_cfg: quote(&config.compiler_extra_config)?,
            deps: deps_stanza(dependencies)?,
            build: build_stanza(config, variant)?,
        })
    }

    fn value(&self, slot: &str) -> Option<&str> {
        match slot {
            "nimurl" => Some(self.nim_url.as_str()),
            "nimhash" => Some(self.nim_hash.as_str()),
            "nimcfg" => Some(self.nim_cfg.as_str()),
            "deps" => Some(self.deps.as_str()),
            "build" => Some(self.build.as_str()),
            _ => None,
        }
    }
}

/// One `get_dep` call per dependency, in the given order.
pub fn deps_stanza(dependencies: &[ResolvedDependency]) -> Result<String> {
    let lines = dependencies
        .iter()
        .map(|dep| {
            Ok(format!(
                "get_dep {} {} {} {}",
                quote(&dep.name)?,
                quote(&dep.url)?,
                quote(&dep.revision)?,
                quote(&dep.suffix)?
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

/// One compiler invocation per build target, sorted by target name.
pub fn build_stanza(config: &ProjectConfig, variant: ScriptVariant) -> Result<String> {
    let mut lines = Vec::with_capacity(config.build_targets.len());

    for (name, args) in &config.build_targets {
        let mut command = String::from("bin/nim c");
        if variant == ScriptVariant::Distribution {
            command.push(' ');
            command.push_str(RELEASE_FLAG);
        }
        // Target names are restricted to plain file names by the config loader.
        command.push_str(&format!(" --out:\"$PWD/bin/{name}\""));
        let args = shlex::split(args).ok_or_else(|| {
            Error::InvalidConfig(format!("unbalanced quotes in build arguments of '{name}'"))
        })?;
        for arg in &args {
            command.push(' ');
            command.push_str(&quote(arg)?);
        }

        lines.push(format!("echo \"building {name}\"; {command}"));
    }

    Ok(lines.join("\n"))
}

/// Substitute every slot of the bootstrap template.
pub fn render_script(slots: &ScriptSlots) -> Result<String> {
    render_template(TEMPLATE, slots)
}

/// Overwrite `build.sh` and mark it executable.
pub fn write_script(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn render_template(template: &str, slots: &ScriptSlots) -> Result<String> {
    let used = placeholders(template);
    let expected: BTreeSet<&str> = SLOT_NAMES.into_iter().collect();
    if used != expected {
        let unused: Vec<_> = expected.difference(&used).collect();
        let unknown: Vec<_> = used.difference(&expected).collect();
        return Err(Error::Template(format!(
            "slot mismatch (unused: {unused:?}, unknown: {unknown:?})"
        )));
    }

    let mut out = String::with_capacity(template.len() + slots.deps.len() + slots.build.len());
    let mut rest = template;
    while let Some(start) = rest.find(DELIMITER) {
        out.push_str(&rest[..start]);
        let after = &rest[start + DELIMITER.len()..];
        let len = ident_len(after);
        let name = &after[..len];
        let value = slots
            .value(name)
            .ok_or_else(|| Error::Template(format!("unknown slot '{DELIMITER}{name}'")))?;
        out.push_str(value);
        rest = &after[len..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Names of all `@@name` placeholders in `template`.
fn placeholders(template: &str) -> BTreeSet<&str> {
    template
        .match_indices(DELIMITER)
        .map(|(idx, _)| {
            let after = &template[idx + DELIMITER.len()..];
            &after[..ident_len(after)]
        })
        .collect()
}

fn ident_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_')
        .count()
}

fn quote(value: &str) -> Result<String> {
    shlex::try_quote(value)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| Error::InvalidConfig(format!("cannot shell-quote {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const REV: &str = "0123456789abcdef0123456789abcdef01234567";

    fn config() -> ProjectConfig {
        ProjectConfig::parse(
            Path::new("nimenv.cfg"),
            "[deps]\n\
             nim: https://nim-lang.org/download/nim-1.6.0.tar.xz deadbeef\n\
             foo: https://example/foo.git sub\n\
             [build]\n\
             app: main.nim\n\
             tool: -d:ssl tools/tool.nim\n\
             [nim]\n\
             --threads:on",
        )
        .unwrap()
    }

    fn resolved() -> Vec<ResolvedDependency> {
        vec![ResolvedDependency {
            name: "foo".to_string(),
            url: "https://example/foo.git".to_string(),
            revision: REV.to_string(),
            local_path: "/repos/foo".to_string(),
            suffix: "/sub".to_string(),
            dirty: false,
        }]
    }

    #[test]
    fn test_template_slots_match() {
        let used = placeholders(TEMPLATE);
        let expected: BTreeSet<&str> = SLOT_NAMES.into_iter().collect();
        assert_eq!(used, expected);
    }

    #[test]
    fn test_deps_stanza() {
        let stanza = deps_stanza(&resolved()).unwrap();
        assert_eq!(stanza, format!("get_dep foo https://example/foo.git {REV} /sub"));
    }

    #[test]
    fn test_deps_stanza_empty_suffix() {
        let mut deps = resolved();
        deps[0].suffix.clear();
        let stanza = deps_stanza(&deps).unwrap();
        assert!(stanza.ends_with(" ''"));
    }

    #[test]
    fn test_build_stanza_variants() {
        let config = config();

        let dist = build_stanza(&config, ScriptVariant::Distribution).unwrap();
        let lines: Vec<_> = dist.lines().collect();
        assert_eq!(
            lines[0],
            "echo \"building app\"; bin/nim c -d:release --out:\"$PWD/bin/app\" main.nim"
        );
        assert_eq!(
            lines[1],
            "echo \"building tool\"; bin/nim c -d:release --out:\"$PWD/bin/tool\" -d:ssl tools/tool.nim"
        );

        let dev = build_stanza(&config, ScriptVariant::Development).unwrap();
        assert!(!dev.contains(RELEASE_FLAG));
        assert!(dev.contains("bin/nim c --out:\"$PWD/bin/app\" main.nim"));
    }

    #[test]
    fn test_build_args_are_quoted() {
        let mut config = config();
        config
            .build_targets
            .insert("app".to_string(), "main.nim;rm".to_string());
        let stanza = build_stanza(&config, ScriptVariant::Development).unwrap();
        assert!(!stanza.contains(" main.nim;rm"));
    }

    #[test]
    fn test_compiler_url_is_not_expanded() {
        let mut config = config();
        config.compiler.url = "https://x/$(uname)/`id`/nim.tar.xz".to_string();
        let slots = ScriptSlots::new(&config, &resolved(), ScriptVariant::Distribution).unwrap();
        let script = render_script(&slots).unwrap();

        // Only the single-quoted assignment may mention the raw URL.
        let mentions: Vec<_> = script.lines().filter(|l| l.contains("$(uname)")).collect();
        assert_eq!(mentions.len(), 1);
        assert!(mentions[0].starts_with("NIMURL='https://x/$(uname)/"));
        assert!(script.contains("echo \"Downloading Nim $NIMURL (sha256: $NIMHASH)\""));
        assert!(script.contains("wget \"$NIMURL\" -O .nimenv/nim.tar.xz"));
    }

    #[test]
    fn test_build_args_split_like_a_shell() {
        let mut config = config();
        config
            .build_targets
            .insert("app".to_string(), "-d:name=\"a b\" main.nim".to_string());
        let stanza = build_stanza(&config, ScriptVariant::Development).unwrap();
        assert!(stanza.contains(" '-d:name=a b' main.nim\n"));

        config
            .build_targets
            .insert("app".to_string(), "\"unterminated main.nim".to_string());
        let err = build_stanza(&config, ScriptVariant::Development).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_render_script() {
        let slots = ScriptSlots::new(&config(), &resolved(), ScriptVariant::Distribution).unwrap();
        let script = render_script(&slots).unwrap();

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(!script.contains(DELIMITER));
        assert!(script.contains("NIMHASH=deadbeef\n"));
        assert!(script.contains("NIMURL=https://nim-lang.org/download/nim-1.6.0.tar.xz\n"));
        assert!(script.contains(&format!("get_dep foo https://example/foo.git {REV} /sub\n")));
        assert!(script.contains("printf '%s\\n' --threads:on >> nim.cfg"));
        assert!(script.ends_with("bin/nim c -d:release --out:\"$PWD/bin/tool\" -d:ssl tools/tool.nim\n"));
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let slots = ScriptSlots::new(&config(), &resolved(), ScriptVariant::Development).unwrap();
        let template = "@@nimurl @@nimhash @@nimcfg @@deps @@build @@extra";
        let err = render_template(template, &slots).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_unused_slot_rejected() {
        let slots = ScriptSlots::new(&config(), &resolved(), ScriptVariant::Development).unwrap();
        let err = render_template("@@nimurl @@deps", &slots).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_script_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("build.sh");
        fs::write(&path, "old contents that are longer than the new ones").unwrap();

        write_script(&path, "#!/bin/sh\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\n");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
