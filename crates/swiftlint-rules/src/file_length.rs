//! Rule to limit the number of lines in a file.

use crate::utils::{is_comment_only, violation_on_line};
use serde_yaml::Value;
use std::any::Any;
use swiftlint_core::rule_configuration::{
    as_bool, check_keys, RuleConfigurationError, SeverityLevelsConfiguration,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`FileLength`].
pub static FILE_LENGTH: RuleDescription = RuleDescription {
    identifier: "file_length",
    name: "File Length",
    description: "Files should not span too many lines.",
    kind: RuleKind::Metrics,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::SOURCEKIT_FREE,
};

/// Flags files with more lines than the configured thresholds.
#[derive(Debug, Clone)]
pub struct FileLength {
    length: SeverityLevelsConfiguration,
    ignore_comment_only_lines: bool,
}

impl Default for FileLength {
    fn default() -> Self {
        Self {
            length: SeverityLevelsConfiguration::new(400, Some(1000)),
            ignore_comment_only_lines: false,
        }
    }
}

impl Rule for FileLength {
    fn description(&self) -> &'static RuleDescription {
        &FILE_LENGTH
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .with("warning", self.length.warning)
            .with("error", self.length.error)
            .with("ignore_comment_only_lines", self.ignore_comment_only_lines)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        let total = file.lines().len();
        let counted = if self.ignore_comment_only_lines {
            file.lines()
                .iter()
                .filter(|line| !is_comment_only(file, line))
                .count()
        } else {
            total
        };
        let Some((severity, threshold)) = self.length.severity_for(counted) else {
            return Vec::new();
        };
        vec![violation_on_line(
            &FILE_LENGTH,
            severity,
            file,
            total,
            format!("File should contain {threshold} lines or less: currently contains {counted}"),
        )]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for FileLength {
    const DESCRIPTION: &'static RuleDescription = &FILE_LENGTH;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        let Some(value) = configuration else {
            return Ok(rule);
        };
        rule.length.apply(value)?;
        if let Value::Mapping(map) = value {
            check_keys(map, &["warning", "error", "ignore_comment_only_lines"])?;
            if let Some(flag) = map.get("ignore_comment_only_lines") {
                rule.ignore_comment_only_lines = as_bool("ignore_comment_only_lines", flag)?;
            }
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swiftlint_core::{RuleStorage, Severity};

    fn lint(yaml: &str, source: &str) -> Vec<StyleViolation> {
        let storage = RuleStorage::new();
        let rule = FileLength::from_configuration(Some(&serde_yaml::from_str(yaml).unwrap())).unwrap();
        rule.validate(
            &SourceFile::virtual_file(source),
            &RuleContext::new(&storage, &[], FILE_LENGTH.identifier),
        )
    }

    #[test]
    fn test_reports_on_last_line() {
        let violations = lint("[2, 3]", "let a = 1\nlet b = 2\nlet c = 3\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].location.line, Some(3));
        assert_eq!(
            violations[0].reason,
            "File should contain 2 lines or less: currently contains 3"
        );
    }

    #[test]
    fn test_comment_only_lines() {
        let source = "// header\n// more\nlet a = 1\n";
        assert_eq!(lint("warning: 2", source).len(), 1);
        assert!(lint("{warning: 2, ignore_comment_only_lines: true}", source).is_empty());
    }
}
