//! Raw configuration documents.
//!
//! The top level of a document is read into an ordered list of entries
//! instead of a map so that a key written twice stays visible to the
//! duplicate-configuration check. Nested values are plain
//! [`serde_yaml::Value`]s.

use crate::issue::Issue;
use regex::Regex;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Top-level entries of one configuration document, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Creates a document from entries.
    #[must_use]
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parses YAML text after expanding `${VAR}` references.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::YamlParsing`] if the text is not a YAML mapping.
    pub fn parse(text: &str) -> Result<Self, Issue> {
        let expanded = expand_environment_variables(text);
        if is_blank(&expanded) {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&expanded).map_err(|e| Issue::YamlParsing {
            message: e.to_string(),
        })
    }

    /// Reads and parses a file.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::FileNotReadable`] or [`Issue::YamlParsing`].
    pub fn read(path: &Path) -> Result<Self, Issue> {
        let text = std::fs::read_to_string(path).map_err(|source| Issue::FileNotReadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Value of the first entry named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries named `key`.
    #[must_use]
    pub fn occurrences(&self, key: &str) -> usize {
        self.entries.iter().filter(|(k, _)| k == key).count()
    }

    /// Every key, in file order and with repetitions.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Every entry, in file order.
    #[must_use]
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// Returns `true` if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of configuration keys")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Document, E> {
        Ok(Document::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<Value, Value>()? {
            let key = match key {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "unsupported key {other:?}"
                    )))
                }
            };
            entries.push((key, value));
        }
        Ok(Document { entries })
    }
}

/// Replaces `${NAME}` with the value of the environment variable, or with
/// nothing if it is unset.
#[must_use]
pub fn expand_environment_variables(text: &str) -> String {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(pattern) = PATTERN
        .get_or_init(|| Regex::new(r"\$\{([^{}]+)\}").ok())
        .as_ref()
    else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |captures: &regex::Captures<'_>| {
            std::env::var(&captures[1]).unwrap_or_default()
        })
        .into_owned()
}

fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_keys_are_kept() {
        let document = Document::parse("line_length: 100\nline_length: 120\n").unwrap();
        assert_eq!(document.occurrences("line_length"), 2);
        assert_eq!(document.get("line_length"), Some(&Value::from(100)));
    }

    #[test]
    fn test_blank_documents() {
        assert!(Document::parse("").unwrap().is_empty());
        assert!(Document::parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_is_an_error() {
        assert!(matches!(
            Document::parse("- a\n- b\n"),
            Err(Issue::YamlParsing { .. })
        ));
    }

    #[test]
    fn test_environment_expansion() {
        std::env::set_var("SWIFTLINT_DOCUMENT_TEST_DIR", "Generated");
        let text = "excluded:\n  - ${SWIFTLINT_DOCUMENT_TEST_DIR}\n  - ${SWIFTLINT_DOCUMENT_TEST_UNSET}x\n";
        let document = Document::parse(text).unwrap();
        let excluded: Vec<&str> = document
            .get("excluded")
            .and_then(Value::as_sequence)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(excluded, vec!["Generated", "x"]);
    }

    #[test]
    fn test_only_literal_booleans() {
        let document = Document::parse("strict: yes\nlenient: true\n").unwrap();
        assert_eq!(document.get("strict"), Some(&Value::from("yes")));
        assert_eq!(document.get("lenient"), Some(&Value::from(true)));
    }
}
