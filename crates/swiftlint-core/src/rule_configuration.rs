//! Building blocks for rule configurations.
//!
//! A rule receives the YAML value found under its identifier. The helpers
//! here read the common shapes (a bare severity, a severity mapping,
//! warning/error thresholds) and report anything unexpected as a
//! [`RuleConfigurationError`], which the catalog turns into a warning and a
//! fall back to the rule's defaults.

use crate::types::Severity;
use serde_yaml::{Mapping, Value};
use std::fmt;
use thiserror::Error;

/// Why a rule configuration could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleConfigurationError {
    /// The value has the wrong shape.
    #[error("expected {expected} for '{key}'")]
    InvalidType {
        /// Offending key, or the rule identifier for the whole value.
        key: String,
        /// What was expected.
        expected: &'static str,
    },

    /// The mapping contains keys the rule does not know.
    #[error("unknown key(s) {}", .keys.join(", "))]
    InvalidKeys {
        /// Unknown keys, sorted.
        keys: Vec<String>,
    },

    /// A severity other than `warning` or `error`.
    #[error("invalid severity '{0}'")]
    InvalidSeverity(String),

    /// A value that is well-formed but not acceptable.
    #[error("{0}")]
    Inconsistent(String),
}

/// Severity of a rule that reports a single kind of violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityConfiguration {
    /// Severity of emitted violations.
    pub severity: Severity,
}

impl SeverityConfiguration {
    /// Creates a configuration with the given default.
    #[must_use]
    pub const fn new(severity: Severity) -> Self {
        Self { severity }
    }

    /// Applies a bare severity string or a mapping with a `severity` key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither.
    pub fn apply(&mut self, value: &Value) -> Result<(), RuleConfigurationError> {
        match value {
            Value::String(s) => {
                self.severity = parse_severity(s)?;
                Ok(())
            }
            Value::Mapping(map) => {
                if let Some(severity) = severity_in(map)? {
                    self.severity = severity;
                }
                Ok(())
            }
            _ => Err(RuleConfigurationError::InvalidType {
                key: "severity".to_string(),
                expected: "a severity",
            }),
        }
    }
}

/// Warning and error thresholds of a metric rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityLevelsConfiguration {
    /// Values at or above this produce a warning.
    pub warning: usize,
    /// Values at or above this produce an error.
    pub error: Option<usize>,
}

impl SeverityLevelsConfiguration {
    /// Creates thresholds.
    #[must_use]
    pub const fn new(warning: usize, error: Option<usize>) -> Self {
        Self { warning, error }
    }

    /// Severity for a measured value, or `None` below both thresholds.
    #[must_use]
    pub fn severity_for(&self, value: usize) -> Option<(Severity, usize)> {
        if let Some(error) = self.error {
            if value > error {
                return Some((Severity::Error, error));
            }
        }
        (value > self.warning).then_some((Severity::Warning, self.warning))
    }

    /// Applies `[warning, error]`, a single warning number, or a mapping
    /// with `warning`/`error` keys.
    ///
    /// # Errors
    ///
    /// Returns an error for any other shape.
    pub fn apply(&mut self, value: &Value) -> Result<(), RuleConfigurationError> {
        match value {
            Value::Number(_) => {
                self.warning = as_usize("warning", value)?;
                self.error = None;
            }
            Value::Sequence(items) if !items.is_empty() && items.len() <= 2 => {
                self.warning = as_usize("warning", &items[0])?;
                self.error = items.get(1).map(|v| as_usize("error", v)).transpose()?;
            }
            Value::Mapping(map) => {
                if let Some(warning) = map.get("warning") {
                    self.warning = as_usize("warning", warning)?;
                }
                if let Some(error) = map.get("error") {
                    self.error = if error.is_null() {
                        None
                    } else {
                        Some(as_usize("error", error)?)
                    };
                }
            }
            _ => {
                return Err(RuleConfigurationError::InvalidType {
                    key: "warning".to_string(),
                    expected: "a number, a pair of numbers or a mapping",
                })
            }
        }
        Ok(())
    }
}

/// Parses `warning` or `error`.
///
/// # Errors
///
/// Returns an error for any other string.
pub fn parse_severity(value: &str) -> Result<Severity, RuleConfigurationError> {
    Severity::parse(value).ok_or_else(|| RuleConfigurationError::InvalidSeverity(value.to_string()))
}

/// Reads the optional `severity` key of a mapping.
///
/// # Errors
///
/// Returns an error if the key holds something else than a severity.
pub fn severity_in(map: &Mapping) -> Result<Option<Severity>, RuleConfigurationError> {
    match map.get("severity") {
        None => Ok(None),
        Some(Value::String(s)) => parse_severity(s).map(Some),
        Some(_) => Err(RuleConfigurationError::InvalidType {
            key: "severity".to_string(),
            expected: "a severity",
        }),
    }
}

/// Checks that a mapping only uses `allowed` keys.
///
/// # Errors
///
/// Returns [`RuleConfigurationError::InvalidKeys`] listing the others.
pub fn check_keys(map: &Mapping, allowed: &[&str]) -> Result<(), RuleConfigurationError> {
    let mut unknown: Vec<String> = map
        .keys()
        .map(|k| k.as_str().map_or_else(|| format!("{k:?}"), str::to_string))
        .filter(|k| !allowed.contains(&k.as_str()))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        unknown.sort();
        Err(RuleConfigurationError::InvalidKeys { keys: unknown })
    }
}

/// Interprets a value as a mapping.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn as_mapping<'a>(key: &str, value: &'a Value) -> Result<&'a Mapping, RuleConfigurationError> {
    value.as_mapping().ok_or_else(|| RuleConfigurationError::InvalidType {
        key: key.to_string(),
        expected: "a mapping",
    })
}

/// Interprets a value as a non-negative integer.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn as_usize(key: &str, value: &Value) -> Result<usize, RuleConfigurationError> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| RuleConfigurationError::InvalidType {
            key: key.to_string(),
            expected: "a non-negative integer",
        })
}

/// Interprets a value as a boolean. Only `true` and `false` qualify.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn as_bool(key: &str, value: &Value) -> Result<bool, RuleConfigurationError> {
    value.as_bool().ok_or_else(|| RuleConfigurationError::InvalidType {
        key: key.to_string(),
        expected: "true or false",
    })
}

/// Interprets a value as a string.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn as_string(key: &str, value: &Value) -> Result<String, RuleConfigurationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RuleConfigurationError::InvalidType {
            key: key.to_string(),
            expected: "a string",
        })
}

/// Interprets a value as a list of strings. A single string is a list of one.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn as_string_list(key: &str, value: &Value) -> Result<Vec<String>, RuleConfigurationError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(items) => items.iter().map(|item| as_string(key, item)).collect(),
        _ => Err(RuleConfigurationError::InvalidType {
            key: key.to_string(),
            expected: "a list of strings",
        }),
    }
}

/// A rendered configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Integer(i64),
    /// A free-form string, rendered quoted.
    Str(String),
    /// A bare symbol such as a severity, rendered unquoted.
    Symbol(String),
    /// A list of strings.
    List(Vec<String>),
    /// A nested description.
    Nested(ConfigurationDescription),
    /// Nothing configured.
    Empty,
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Severity> for OptionValue {
    fn from(value: Severity) -> Self {
        Self::Symbol(value.to_string())
    }
}

impl From<Option<usize>> for OptionValue {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Symbol(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Nested(nested) => write!(f, "{{{}}}", nested.one_line()),
            Self::Empty => Ok(()),
        }
    }
}

/// Ordered description of a rule's configuration.
///
/// Used for listing rules and as part of the configuration fingerprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationDescription {
    entries: Vec<(String, OptionValue)>,
}

impl ConfigurationDescription {
    /// Creates an empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `severity` entry.
    #[must_use]
    pub fn severity(self, severity: Severity) -> Self {
        self.with("severity", severity)
    }

    /// Appends an entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Appends a nested description.
    #[must_use]
    pub fn nested(self, key: impl Into<String>, nested: ConfigurationDescription) -> Self {
        self.with(key, OptionValue::Nested(nested))
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(String, OptionValue)] {
        &self.entries
    }

    /// Returns `true` if nothing is described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders `key: value; key: value` on one line.
    #[must_use]
    pub fn one_line(&self) -> String {
        self.entries
            .iter()
            .filter(|(_, v)| *v != OptionValue::Empty)
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Renders as indented YAML-like text.
    #[must_use]
    pub fn yaml(&self) -> String {
        let mut out = String::new();
        self.write_yaml(&mut out, 0);
        out
    }

    fn write_yaml(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (key, value) in &self.entries {
            match value {
                OptionValue::Empty => {}
                OptionValue::Nested(nested) => {
                    out.push_str(&format!("{indent}{key}:\n"));
                    nested.write_yaml(out, depth + 1);
                }
                other => out.push_str(&format!("{indent}{key}: {other}\n")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_severity_from_string_and_mapping() {
        let mut config = SeverityConfiguration::new(Severity::Warning);
        config.apply(&yaml("error")).unwrap();
        assert_eq!(config.severity, Severity::Error);

        config.apply(&yaml("severity: warning")).unwrap();
        assert_eq!(config.severity, Severity::Warning);

        assert_eq!(
            config.apply(&yaml("fatal")),
            Err(RuleConfigurationError::InvalidSeverity("fatal".to_string()))
        );
    }

    #[test]
    fn test_severity_levels_shapes() {
        let mut levels = SeverityLevelsConfiguration::new(120, Some(200));
        levels.apply(&yaml("[100, 150]")).unwrap();
        assert_eq!(levels, SeverityLevelsConfiguration::new(100, Some(150)));

        levels.apply(&yaml("80")).unwrap();
        assert_eq!(levels, SeverityLevelsConfiguration::new(80, None));

        levels.apply(&yaml("{warning: 90, error: 95}")).unwrap();
        assert_eq!(levels, SeverityLevelsConfiguration::new(90, Some(95)));

        assert!(levels.apply(&yaml("\"long\"")).is_err());
    }

    #[test]
    fn test_severity_for() {
        let levels = SeverityLevelsConfiguration::new(10, Some(20));
        assert_eq!(levels.severity_for(10), None);
        assert_eq!(levels.severity_for(11), Some((Severity::Warning, 10)));
        assert_eq!(levels.severity_for(21), Some((Severity::Error, 20)));
    }

    #[test]
    fn test_check_keys() {
        let map = yaml("{severity: error, bogus: 1, also_bogus: 2}");
        let err = check_keys(map.as_mapping().unwrap(), &["severity"]).unwrap_err();
        assert_eq!(
            err,
            RuleConfigurationError::InvalidKeys {
                keys: vec!["also_bogus".to_string(), "bogus".to_string()]
            }
        );
    }

    #[test]
    fn test_description_rendering() {
        let description = ConfigurationDescription::new()
            .severity(Severity::Warning)
            .with("ignores_urls", false)
            .nested(
                "length",
                ConfigurationDescription::new()
                    .with("warning", 120usize)
                    .with("error", Some(200usize)),
            );
        assert_eq!(
            description.one_line(),
            "severity: warning; ignores_urls: false; length: {warning: 120; error: 200}"
        );
        assert_eq!(
            description.yaml(),
            "severity: warning\nignores_urls: false\nlength:\n  warning: 120\n  error: 200\n"
        );
    }
}
