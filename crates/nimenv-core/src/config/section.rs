//! Section and key/value parsing.
//!
//! Both input files share one syntax:
//!
//! ```text
//! [deps]
//! nim: https://nim-lang.org/download/nim-1.6.0.tar.xz 1b4c...  # url sha256
//! foo: https://example/foo.git src
//!
//! [build]
//! app: main.nim
//! ```
//!
//! A `[name]` line opens a section; every following line, blank lines included,
//! belongs to it verbatim until the next header.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// One `[name]` block and its raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Lines after the header, joined with `\n`.
    pub body: String,
    /// 1-based line number of the header.
    pub line: usize,
}

/// All sections of a document, keyed by name. A repeated name replaces the earlier section.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    sections: BTreeMap<String, Section>,
}

impl Sections {
    /// Split a document into sections.
    ///
    /// `path` is only used for error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut sections = BTreeMap::new();
        let mut current: Option<(String, usize, Vec<&str>)> = None;

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;

            if line.starts_with('[') && line.ends_with(']') {
                let name = line.trim_matches(|c: char| c == '[' || c == ']');
                if name.trim().is_empty() {
                    return Err(Error::Parse {
                        path: path.to_path_buf(),
                        line: lineno,
                        message: "empty section name".to_string(),
                    });
                }
                if let Some((prev, start, body)) = current.take() {
                    sections.insert(prev.clone(), Section::new(prev, start, &body));
                }
                current = Some((name.to_string(), lineno, Vec::new()));
                continue;
            }

            match current.as_mut() {
                Some((_, _, body)) => body.push(line),
                None => {
                    if !strip_comment(line).is_empty() {
                        return Err(Error::Parse {
                            path: path.to_path_buf(),
                            line: lineno,
                            message: format!("text outside of any section: '{}'", line.trim()),
                        });
                    }
                }
            }
        }

        if let Some((prev, start, body)) = current.take() {
            sections.insert(prev.clone(), Section::new(prev, start, &body));
        }

        Ok(Self { sections })
    }

    /// Get a section by name.
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Parse a section body as a key/value table. A missing section yields an empty table.
    pub fn table(&self, path: &Path, name: &str) -> Result<KvTable> {
        match self.get(name) {
            Some(section) => KvTable::parse(path, section.line, &section.body),
            None => Ok(KvTable::default()),
        }
    }

    /// Raw body of a section, or the empty string if absent.
    pub fn body(&self, name: &str) -> &str {
        self.get(name).map(|s| s.body.as_str()).unwrap_or("")
    }
}

impl Section {
    fn new(name: String, line: usize, body: &[&str]) -> Self {
        Self {
            name,
            body: body.join("\n"),
            line,
        }
    }
}

/// Key/value pairs of one section body.
///
/// Keys iterate in lexicographic order; duplicate keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvTable {
    entries: BTreeMap<String, String>,
}

impl KvTable {
    /// Parse `key: value` lines.
    ///
    /// `header_line` is the line number of the section header so errors point
    /// at the right line of the file.
    pub fn parse(path: &Path, header_line: usize, body: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (idx, raw) in body.lines().enumerate() {
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    line: header_line + idx + 1,
                    message: format!("expected 'key: value', found '{line}'"),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    line: header_line + idx + 1,
                    message: "empty key".to_string(),
                });
            }

            entries.insert(key.to_string(), value.trim().to_string());
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back into a section body, one `key: value` line per entry, sorted.
    pub fn to_body(&self) -> String {
        let mut body = String::new();
        for (key, value) in &self.entries {
            body.push_str(&format!("{key}: {value}\n"));
        }
        body
    }
}

/// Drop everything from the first `#` and trim.
fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("nimenv.cfg")
    }

    #[test]
    fn test_split_sections() {
        let text = "[deps]\nfoo: a\n\n[nim]\n--threads:on\n\n-d:ssl";
        let sections = Sections::parse(path(), text).unwrap();

        assert_eq!(sections.body("deps"), "foo: a\n");
        assert_eq!(sections.body("nim"), "--threads:on\n\n-d:ssl");
        assert_eq!(sections.get("nim").unwrap().line, 4);
        assert_eq!(sections.body("build"), "");
    }

    #[test]
    fn test_leading_comments_allowed() {
        let text = "# project config\n\n[build]\napp: main.nim";
        let sections = Sections::parse(path(), text).unwrap();
        assert_eq!(sections.body("build"), "app: main.nim");
    }

    #[test]
    fn test_text_before_first_section() {
        let err = Sections::parse(path(), "foo: bar\n[deps]").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_empty_section_name() {
        let err = Sections::parse(path(), "[deps]\n[]\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_section_last_wins() {
        let sections = Sections::parse(path(), "[build]\na: 1\n[build]\nb: 2").unwrap();
        assert_eq!(sections.body("build"), "b: 2");
    }

    #[test]
    fn test_parse_kv() {
        let body = "# comment\nfoo : https://x/foo.git  # trailing\n\nbar:baz qux\n";
        let table = KvTable::parse(path(), 1, body).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("foo"), Some("https://x/foo.git"));
        assert_eq!(table.get("bar"), Some("baz qux"));
    }

    #[test]
    fn test_kv_splits_at_first_colon() {
        let table = KvTable::parse(path(), 1, "nim: https://host:8080/nim.tar.xz abc").unwrap();
        assert_eq!(table.get("nim"), Some("https://host:8080/nim.tar.xz abc"));
    }

    #[test]
    fn test_kv_duplicate_last_wins() {
        let table = KvTable::parse(path(), 1, "a: 1\na: 2").unwrap();
        assert_eq!(table.get("a"), Some("2"));
    }

    #[test]
    fn test_kv_missing_separator() {
        let err = KvTable::parse(path(), 3, "a: 1\nbroken line").unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 5);
                assert!(message.contains("broken line"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_body_sorted() {
        let mut table = KvTable::default();
        table.insert("zeta", "/z");
        table.insert("alpha", "/a");
        assert_eq!(table.to_body(), "alpha: /a\nzeta: /z\n");

        let reparsed = KvTable::parse(path(), 1, &table.to_body()).unwrap();
        assert_eq!(reparsed, table);
    }
}
