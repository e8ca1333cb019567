//! Rule to forbid whitespace at the end of lines. Correctable.
//!
//! # Configuration
//!
//! - `severity` (default: `warning`)
//! - `ignores_empty_lines`: allow lines made only of whitespace (default: false)
//! - `ignores_comments`: allow trailing whitespace after comments (default: true)

use crate::utils::{is_comment_only, violation_on_line};
use serde_yaml::Value;
use std::any::Any;
use swiftlint_core::rule_configuration::{
    as_bool, check_keys, severity_in, RuleConfigurationError, SeverityConfiguration,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Correction, Line, Location, Rule,
    RuleContext, RuleDescription, RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`TrailingWhitespace`].
pub static TRAILING_WHITESPACE: RuleDescription = RuleDescription {
    identifier: "trailing_whitespace",
    name: "Trailing Whitespace",
    description: "Lines should not have trailing whitespace",
    kind: RuleKind::Style,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::CORRECTABLE,
};

/// Flags and strips trailing spaces and tabs.
#[derive(Debug, Clone)]
pub struct TrailingWhitespace {
    severity: Severity,
    ignores_empty_lines: bool,
    ignores_comments: bool,
}

impl Default for TrailingWhitespace {
    fn default() -> Self {
        Self {
            severity: Severity::Warning,
            ignores_empty_lines: false,
            ignores_comments: true,
        }
    }
}

impl TrailingWhitespace {
    fn is_violating(&self, file: &SourceFile, line: &Line) -> bool {
        let trimmed = line.content.trim_end();
        if trimmed.len() == line.content.len() {
            return false;
        }
        if self.ignores_empty_lines && trimmed.is_empty() {
            return false;
        }
        if self.ignores_comments && !trimmed.is_empty() {
            let last = line.offset + trimmed.len() - 1;
            if file.is_in_comment(last) || is_comment_only(file, line) {
                return false;
            }
        }
        true
    }

    fn is_disabled_on(file: &SourceFile, line: usize) -> bool {
        let location = Location::line(file.path().map(Into::into), line);
        file.regions()
            .iter()
            .find(|r| r.contains(&location))
            .is_some_and(|r| r.is_rule_disabled(&TRAILING_WHITESPACE))
    }
}

impl Rule for TrailingWhitespace {
    fn description(&self) -> &'static RuleDescription {
        &TRAILING_WHITESPACE
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .severity(self.severity)
            .with("ignores_empty_lines", self.ignores_empty_lines)
            .with("ignores_comments", self.ignores_comments)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        file.lines()
            .iter()
            .filter(|line| self.is_violating(file, line))
            .map(|line| {
                violation_on_line(
                    &TRAILING_WHITESPACE,
                    self.severity,
                    file,
                    line.index,
                    TRAILING_WHITESPACE.description,
                )
            })
            .collect()
    }

    fn correct(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Option<(String, Vec<Correction>)> {
        let mut corrected = String::with_capacity(file.contents().len());
        let mut corrections = Vec::new();
        let mut rest = file.contents();
        for line in file.lines() {
            let raw_length = rest.find('\n').map_or(rest.len(), |i| i + 1);
            let (raw, tail) = rest.split_at(raw_length);
            rest = tail;
            if self.is_violating(file, line) && !Self::is_disabled_on(file, line.index) {
                corrected.push_str(line.content.trim_end());
                corrected.push_str(&raw[line.content.len()..]);
                corrections.push(Correction {
                    rule_identifier: TRAILING_WHITESPACE.identifier.to_string(),
                    location: Location::line(file.path().map(Into::into), line.index),
                });
            } else {
                corrected.push_str(raw);
            }
        }
        (!corrections.is_empty()).then_some((corrected, corrections))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for TrailingWhitespace {
    const DESCRIPTION: &'static RuleDescription = &TRAILING_WHITESPACE;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        match configuration {
            None => {}
            Some(value @ Value::String(_)) => {
                let mut severity = SeverityConfiguration::new(rule.severity);
                severity.apply(value)?;
                rule.severity = severity.severity;
            }
            Some(Value::Mapping(map)) => {
                check_keys(map, &["severity", "ignores_empty_lines", "ignores_comments"])?;
                if let Some(severity) = severity_in(map)? {
                    rule.severity = severity;
                }
                if let Some(flag) = map.get("ignores_empty_lines") {
                    rule.ignores_empty_lines = as_bool("ignores_empty_lines", flag)?;
                }
                if let Some(flag) = map.get("ignores_comments") {
                    rule.ignores_comments = as_bool("ignores_comments", flag)?;
                }
            }
            Some(_) => {
                return Err(RuleConfigurationError::InvalidType {
                    key: TRAILING_WHITESPACE.identifier.to_string(),
                    expected: "a severity or a mapping",
                })
            }
        }
        Ok(rule)
    }
}
