//! Opt-in rule preferring `isEmpty` over comparing `count` to zero.

use crate::utils::{code_matches, static_regex, violation_at};
use serde_yaml::Value;
use std::any::Any;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{
    as_bool, check_keys, severity_in, RuleConfigurationError, SeverityConfiguration,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`EmptyCount`].
pub static EMPTY_COUNT: RuleDescription = RuleDescription {
    identifier: "empty_count",
    name: "Empty Count",
    description: "Prefer checking `isEmpty` over comparing `count` to zero",
    kind: RuleKind::Performance,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::OPT_IN,
};

/// Flags `count == 0` and similar comparisons.
#[derive(Debug, Clone)]
pub struct EmptyCount {
    severity: Severity,
    only_after_dot: bool,
}

impl Default for EmptyCount {
    fn default() -> Self {
        Self {
            severity: Severity::Error,
            only_after_dot: false,
        }
    }
}

impl Rule for EmptyCount {
    fn description(&self) -> &'static RuleDescription {
        &EMPTY_COUNT
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .severity(self.severity)
            .with("only_after_dot", self.only_after_dot)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        static ANYWHERE: OnceLock<Option<regex::Regex>> = OnceLock::new();
        static AFTER_DOT: OnceLock<Option<regex::Regex>> = OnceLock::new();
        let pattern = if self.only_after_dot {
            static_regex(&AFTER_DOT, r"\.count\s*(?:==|!=|<=?|>=?)\s*0\b")
        } else {
            static_regex(&ANYWHERE, r"\bcount\s*(?:==|!=|<=?|>=?)\s*0\b")
        };
        let Some(pattern) = pattern else {
            return Vec::new();
        };
        code_matches(file, pattern)
            .map(|offset| {
                let offset = if self.only_after_dot { offset + 1 } else { offset };
                violation_at(&EMPTY_COUNT, self.severity, file, offset, EMPTY_COUNT.description)
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for EmptyCount {
    const DESCRIPTION: &'static RuleDescription = &EMPTY_COUNT;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        match configuration {
            None => {}
            Some(Value::Mapping(map)) => {
                check_keys(map, &["severity", "only_after_dot"])?;
                if let Some(severity) = severity_in(map)? {
                    rule.severity = severity;
                }
                if let Some(flag) = map.get("only_after_dot") {
                    rule.only_after_dot = as_bool("only_after_dot", flag)?;
                }
            }
            Some(value) => {
                let mut severity = SeverityConfiguration::new(rule.severity);
                severity.apply(value)?;
                rule.severity = severity.severity;
            }
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use swiftlint_core::RuleStorage;

    fn count(rule: &EmptyCount, source: &str) -> usize {
        let storage = RuleStorage::new();
        rule.validate(
            &SourceFile::virtual_file(source),
            &RuleContext::new(&storage, &[], EMPTY_COUNT.identifier),
        )
        .len()
    }

    #[rstest]
    #[case("if items.count == 0 {}\n", 1)]
    #[case("if count != 0 {}\n", 1)]
    #[case("if items.count > 0 {}\n", 1)]
    #[case("if items.count == 01 {}\n", 0)]
    #[case("if items.isEmpty {}\n", 0)]
    #[case("if items.count == 1 {}\n", 0)]
    #[case("// items.count == 0\n", 0)]
    fn test_default(#[case] source: &str, #[case] expected: usize) {
        assert_eq!(count(&EmptyCount::default(), source), expected);
    }

    #[test]
    fn test_only_after_dot() {
        let rule = EmptyCount::from_configuration(Some(&serde_yaml::from_str("only_after_dot: true").unwrap())).unwrap();
        assert_eq!(count(&rule, "if count == 0 {}\nif items.count == 0 {}\n"), 1);
    }

    #[test]
    fn test_is_opt_in() {
        assert!(EMPTY_COUNT.has(Capabilities::OPT_IN));
    }
}
