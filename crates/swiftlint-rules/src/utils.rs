//! Helpers shared by the built-in rules.

use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{check_keys, RuleConfigurationError, SeverityConfiguration};
use swiftlint_core::{Location, RuleDescription, Severity, SourceFile, StyleViolation};

/// Compiles a fixed pattern once. `None` only if the pattern is invalid.
pub(crate) fn static_regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Byte offsets of `pattern` matches that start in code, outside comments
/// and string literals.
pub(crate) fn code_matches<'a>(
    file: &'a SourceFile,
    pattern: &'a Regex,
) -> impl Iterator<Item = usize> + 'a {
    pattern
        .find_iter(file.contents())
        .map(|m| m.start())
        .filter(|offset| !file.is_in_comment_or_string(*offset))
}

/// A violation of `description` at a byte offset of `file`.
pub(crate) fn violation_at(
    description: &RuleDescription,
    severity: Severity,
    file: &SourceFile,
    offset: usize,
    reason: impl Into<String>,
) -> StyleViolation {
    StyleViolation::new(
        description.identifier,
        description.name,
        severity,
        file.location(offset),
        reason,
    )
}

/// A violation of `description` covering a whole line of `file`.
pub(crate) fn violation_on_line(
    description: &RuleDescription,
    severity: Severity,
    file: &SourceFile,
    line: usize,
    reason: impl Into<String>,
) -> StyleViolation {
    StyleViolation::new(
        description.identifier,
        description.name,
        severity,
        Location::line(file.path().map(Into::into), line),
        reason,
    )
}

/// Reads the configuration of a rule that only has a severity.
pub(crate) fn severity_only(
    configuration: Option<&Value>,
    default: Severity,
) -> Result<SeverityConfiguration, RuleConfigurationError> {
    let mut severity = SeverityConfiguration::new(default);
    if let Some(value) = configuration {
        if let Value::Mapping(map) = value {
            check_keys(map, &["severity"])?;
        }
        severity.apply(value)?;
    }
    Ok(severity)
}

/// Returns `true` if the line holds nothing but a comment.
pub(crate) fn is_comment_only(file: &SourceFile, line: &swiftlint_core::Line) -> bool {
    let trimmed = line.content.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    let first = line.offset + (line.content.len() - trimmed.len());
    let last = line.offset + line.content.trim_end().len() - 1;
    file.is_in_comment(first) && file.is_in_comment(last)
}
