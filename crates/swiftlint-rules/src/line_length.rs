//! Rule to limit the length of lines.
//!
//! # Configuration
//!
//! - `warning`, `error`: thresholds in characters (default: 120, 200)
//! - `ignores_comments`: skip lines holding only a comment (default: false)
//! - `ignores_urls`: do not count URLs towards the length (default: false)
//!
//! A bare number or a `[warning, error]` pair sets the thresholds only.

use crate::utils::{is_comment_only, static_regex, violation_on_line};
use serde_yaml::Value;
use std::any::Any;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{
    as_bool, check_keys, RuleConfigurationError, SeverityLevelsConfiguration,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`LineLength`].
pub static LINE_LENGTH: RuleDescription = RuleDescription {
    identifier: "line_length",
    name: "Line Length",
    description: "Lines should not span too many characters.",
    kind: RuleKind::Metrics,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

/// Flags lines longer than the configured thresholds.
#[derive(Debug, Clone)]
pub struct LineLength {
    length: SeverityLevelsConfiguration,
    ignores_comments: bool,
    ignores_urls: bool,
}

impl Default for LineLength {
    fn default() -> Self {
        Self {
            length: SeverityLevelsConfiguration::new(120, Some(200)),
            ignores_comments: false,
            ignores_urls: false,
        }
    }
}

impl LineLength {
    fn measured(&self, content: &str) -> usize {
        static URL: OnceLock<Option<regex::Regex>> = OnceLock::new();
        if self.ignores_urls {
            if let Some(url) = static_regex(&URL, r"[a-z]+://\S+") {
                return url.replace_all(content, "").chars().count();
            }
        }
        content.chars().count()
    }
}

impl Rule for LineLength {
    fn description(&self) -> &'static RuleDescription {
        &LINE_LENGTH
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .with("warning", self.length.warning)
            .with("error", self.length.error)
            .with("ignores_comments", self.ignores_comments)
            .with("ignores_urls", self.ignores_urls)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        file.lines()
            .iter()
            .filter(|line| !(self.ignores_comments && is_comment_only(file, line)))
            .filter_map(|line| {
                let length = self.measured(&line.content);
                let (severity, threshold) = self.length.severity_for(length)?;
                Some(violation_on_line(
                    &LINE_LENGTH,
                    severity,
                    file,
                    line.index,
                    format!(
                        "Line should be {threshold} characters or less; currently it has {length} characters"
                    ),
                ))
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for LineLength {
    const DESCRIPTION: &'static RuleDescription = &LINE_LENGTH;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        let Some(value) = configuration else {
            return Ok(rule);
        };
        rule.length.apply(value)?;
        if let Value::Mapping(map) = value {
            check_keys(map, &["warning", "error", "ignores_comments", "ignores_urls"])?;
            if let Some(flag) = map.get("ignores_comments") {
                rule.ignores_comments = as_bool("ignores_comments", flag)?;
            }
            if let Some(flag) = map.get("ignores_urls") {
                rule.ignores_urls = as_bool("ignores_urls", flag)?;
            }
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use swiftlint_core::{RuleStorage, Severity};

    fn lint(rule: &LineLength, source: &str) -> Vec<(usize, Severity)> {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file(source);
        rule.validate(&file, &RuleContext::new(&storage, &[], LINE_LENGTH.identifier))
            .iter()
            .map(|v| (v.location.line.unwrap_or(0), v.severity))
            .collect()
    }

    fn rule(yaml: &str) -> LineLength {
        LineLength::from_configuration(Some(&serde_yaml::from_str(yaml).unwrap())).unwrap()
    }

    #[rstest]
    #[case(10, vec![])]
    #[case(11, vec![(1, Severity::Warning)])]
    #[case(21, vec![(1, Severity::Error)])]
    fn test_thresholds(#[case] length: usize, #[case] expected: Vec<(usize, Severity)>) {
        let source = format!("{}\n", "a".repeat(length));
        assert_eq!(lint(&rule("[10, 20]"), &source), expected);
    }

    #[test]
    fn test_reason_names_threshold_and_length() {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file(format!("{}\n", "x".repeat(131)));
        let violations = LineLength::default()
            .validate(&file, &RuleContext::new(&storage, &[], LINE_LENGTH.identifier));
        assert_eq!(
            violations[0].reason,
            "Line should be 120 characters or less; currently it has 131 characters"
        );
        assert_eq!(violations[0].location.character, None);
    }

    #[test]
    fn test_ignores_comments() {
        let source = format!("// {}\nlet a = 1 // {}\n", "c".repeat(20), "c".repeat(20));
        assert_eq!(lint(&rule("warning: 10"), &source).len(), 2);
        assert_eq!(
            lint(&rule("{warning: 10, ignores_comments: true}"), &source),
            vec![(2, Severity::Warning)]
        );
    }

    #[test]
    fn test_ignores_urls() {
        let source = "// see https://example.com/a/very/long/path/to/somewhere\n";
        assert_eq!(lint(&rule("warning: 20"), source).len(), 1);
        assert!(lint(&rule("{warning: 20, ignores_urls: true}"), source).is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let error = LineLength::from_configuration(Some(&serde_yaml::from_str("{warning: 1, bogus: 2}").unwrap()))
            .unwrap_err();
        assert_eq!(
            error,
            RuleConfigurationError::InvalidKeys {
                keys: vec!["bogus".to_string()]
            }
        );
    }

    #[test]
    fn test_description() {
        assert_eq!(
            LineLength::default().configuration_description().one_line(),
            "warning: 120; error: 200; ignores_comments: false; ignores_urls: false"
        );
    }
}
