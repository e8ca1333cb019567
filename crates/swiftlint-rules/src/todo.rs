//! Rule to flag `TODO` and `FIXME` markers in comments.

use crate::utils::{static_regex, violation_at};
use serde_yaml::Value;
use std::any::Any;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{
    as_string_list, check_keys, severity_in, OptionValue, RuleConfigurationError,
    SeverityConfiguration,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`Todo`].
pub static TODO: RuleDescription = RuleDescription {
    identifier: "todo",
    name: "Todo",
    description: "TODOs and FIXMEs should be resolved.",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

const MESSAGE_LIMIT: usize = 30;

/// Flags `TODO` and `FIXME` markers found in comments.
#[derive(Debug, Clone)]
pub struct Todo {
    severity: Severity,
    only: Vec<String>,
}

impl Default for Todo {
    fn default() -> Self {
        Self {
            severity: Severity::Warning,
            only: vec!["TODO".to_string(), "FIXME".to_string()],
        }
    }
}

fn reason(kind: &str, message: &str) -> String {
    let message = message.trim_start_matches(':').trim();
    if message.is_empty() {
        return format!("{kind}s should be resolved");
    }
    let shortened: String = message.chars().take(MESSAGE_LIMIT).collect();
    if shortened.len() < message.len() {
        format!("{kind}s should be resolved ({shortened}...)")
    } else {
        format!("{kind}s should be resolved ({message})")
    }
}

impl Rule for Todo {
    fn description(&self) -> &'static RuleDescription {
        &TODO
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .severity(self.severity)
            .with("only", OptionValue::List(self.only.clone()))
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
        let Some(pattern) = static_regex(&PATTERN, r"\b(TODO|FIXME)(?::|\b)([^\n]*)") else {
            return Vec::new();
        };
        pattern
            .captures_iter(file.contents())
            .filter_map(|captures| {
                let marker = captures.get(1)?;
                if !self.only.iter().any(|kind| kind == marker.as_str())
                    || !file.is_in_comment(marker.start())
                {
                    return None;
                }
                let message = captures.get(2).map_or("", |m| m.as_str());
                let message = message.trim_end_matches("*/");
                Some(violation_at(
                    &TODO,
                    self.severity,
                    file,
                    marker.start(),
                    reason(marker.as_str(), message),
                ))
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for Todo {
    const DESCRIPTION: &'static RuleDescription = &TODO;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        match configuration {
            None => {}
            Some(Value::Mapping(map)) => {
                check_keys(map, &["severity", "only"])?;
                if let Some(severity) = severity_in(map)? {
                    rule.severity = severity;
                }
                if let Some(only) = map.get("only") {
                    let only = as_string_list("only", only)?;
                    if let Some(bad) = only.iter().find(|k| *k != "TODO" && *k != "FIXME") {
                        return Err(RuleConfigurationError::Inconsistent(format!(
                            "'{bad}' is neither TODO nor FIXME"
                        )));
                    }
                    rule.only = only;
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
    use pretty_assertions::assert_eq;
    use swiftlint_core::RuleStorage;

    fn reasons(rule: &Todo, source: &str) -> Vec<String> {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file(source);
        rule.validate(&file, &RuleContext::new(&storage, &[], TODO.identifier))
            .into_iter()
            .map(|v| v.reason)
            .collect()
    }

    #[test]
    fn test_markers_in_comments() {
        let source = "// TODO: handle errors\nlet a = 1 // FIXME\n/* TODO */\n";
        assert_eq!(
            reasons(&Todo::default(), source),
            vec![
                "TODOs should be resolved (handle errors)",
                "FIXMEs should be resolved",
                "TODOs should be resolved",
            ]
        );
    }

    #[test]
    fn test_markers_outside_comments_are_ignored() {
        assert!(reasons(&Todo::default(), "let TODO = \"FIXME\"\nlet TODOs = 1\n").is_empty());
    }

    #[test]
    fn test_long_message_is_shortened() {
        let source = "// TODO: this message is definitely longer than thirty characters\n";
        assert_eq!(
            reasons(&Todo::default(), source),
            vec!["TODOs should be resolved (this message is definitely lon...)"]
        );
    }

    #[test]
    fn test_only_option() {
        let rule = Todo::from_configuration(Some(&serde_yaml::from_str("only: [FIXME]").unwrap())).unwrap();
        assert_eq!(reasons(&rule, "// TODO\n// FIXME\n"), vec!["FIXMEs should be resolved"]);
        assert!(Todo::from_configuration(Some(&serde_yaml::from_str("only: [NOTE]").unwrap())).is_err());
    }
}
