//! Rule requiring `swiftlint:disable` commands to be balanced.
//!
//! # Configuration
//!
//! - `severity` (default: `warning`)
//! - `allowed_rules`: rules that may stay disabled until the end of the file
//! - `always_blanket_disable`: rules that may only be disabled for the whole
//!   file

use serde_yaml::Value;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use swiftlint_core::rule_configuration::{
    as_string_list, check_keys, severity_in, OptionValue, RuleConfigurationError,
    SeverityConfiguration,
};
use swiftlint_core::{
    Action, Capabilities, Command, ConfigurableRule, ConfigurationDescription, Location, Rule,
    RuleContext, RuleDescription, RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`BlanketDisableCommand`].
pub static BLANKET_DISABLE_COMMAND: RuleDescription = RuleDescription {
    identifier: "blanket_disable_command",
    name: "Blanket Disable Command",
    description: "swiftlint:disable commands should be re-enabled before the end of the file",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

const DEFAULT_ALLOWED: &[&str] = &[
    "file_header",
    "file_length",
    "file_name",
    "file_name_no_space",
    "single_test_class",
];

/// Flags disable commands that are never re-enabled, duplicated, or
/// unbalanced.
#[derive(Debug, Clone)]
pub struct BlanketDisableCommand {
    severity: Severity,
    allowed_rules: BTreeSet<String>,
    always_blanket_disable: BTreeSet<String>,
}

impl Default for BlanketDisableCommand {
    fn default() -> Self {
        Self {
            severity: Severity::Warning,
            allowed_rules: DEFAULT_ALLOWED.iter().map(|s| (*s).to_string()).collect(),
            always_blanket_disable: BTreeSet::new(),
        }
    }
}

impl BlanketDisableCommand {
    fn violation(&self, file: &SourceFile, command: &Command, reason: String) -> StyleViolation {
        StyleViolation::new(
            BLANKET_DISABLE_COMMAND.identifier,
            BLANKET_DISABLE_COMMAND.name,
            self.severity,
            Location::from_parts(file.path().map(Into::into), Some(command.line), command.character),
            reason,
        )
    }

    fn always_blanket_violations(&self, file: &SourceFile, commands: &[&Command]) -> Vec<StyleViolation> {
        let mut violations = Vec::new();
        for command in commands {
            let named = command
                .rule_identifiers
                .iter()
                .filter(|id| self.always_blanket_disable.contains(*id));
            for id in named {
                if command.action == Action::Enable {
                    violations.push(self.violation(
                        file,
                        command,
                        format!("The '{id}' rule applies to the whole file and thus doesn't need to be re-enabled"),
                    ));
                } else if command.modifier.is_some() {
                    violations.push(self.violation(
                        file,
                        command,
                        format!(
                            "The '{id}' rule applies to the whole file and thus cannot be disabled \
                             locally with 'previous', 'this' or 'next'"
                        ),
                    ));
                }
            }
        }
        violations
    }
}

impl Rule for BlanketDisableCommand {
    fn description(&self) -> &'static RuleDescription {
        &BLANKET_DISABLE_COMMAND
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new()
            .severity(self.severity)
            .with("allowed_rules", OptionValue::List(self.allowed_rules.iter().cloned().collect()))
            .with(
                "always_blanket_disable",
                OptionValue::List(self.always_blanket_disable.iter().cloned().collect()),
            )
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        let commands: Vec<&Command> = file.raw_commands().iter().filter(|c| c.is_valid()).collect();
        let mut violations = Vec::new();
        let mut disabled: BTreeSet<&str> = BTreeSet::new();
        let mut disabled_by: BTreeMap<&str, &Command> = BTreeMap::new();

        for command in &commands {
            let ids = command.rule_identifiers.iter().map(String::as_str);
            match command.action {
                Action::Disable => {
                    for id in ids.clone().filter(|id| disabled.contains(id)) {
                        violations.push(self.violation(
                            file,
                            command,
                            format!("The disabled '{id}' rule was already disabled"),
                        ));
                    }
                }
                Action::Enable => {
                    for id in ids.clone().filter(|id| !disabled.contains(id)) {
                        violations.push(self.violation(
                            file,
                            command,
                            format!("The enabled '{id}' rule was not disabled"),
                        ));
                    }
                }
                Action::Invalid => {}
            }

            if command.modifier.is_some() {
                continue;
            }
            match command.action {
                Action::Disable => {
                    for id in ids {
                        disabled.insert(id);
                        disabled_by.insert(id, command);
                    }
                }
                Action::Enable => {
                    for id in ids {
                        disabled.remove(id);
                        disabled_by.remove(id);
                    }
                }
                Action::Invalid => {}
            }
        }

        for id in disabled.iter().filter(|id| !self.allowed_rules.contains(**id)) {
            if let Some(command) = disabled_by.get(id) {
                violations.push(self.violation(
                    file,
                    command,
                    format!("The disabled '{id}' rule should be re-enabled before the end of the file"),
                ));
            }
        }

        if !self.always_blanket_disable.is_empty() {
            violations.extend(self.always_blanket_violations(file, &commands));
        }
        violations
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for BlanketDisableCommand {
    const DESCRIPTION: &'static RuleDescription = &BLANKET_DISABLE_COMMAND;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut rule = Self::default();
        match configuration {
            None => {}
            Some(Value::Mapping(map)) => {
                check_keys(map, &["severity", "allowed_rules", "always_blanket_disable"])?;
                if let Some(severity) = severity_in(map)? {
                    rule.severity = severity;
                }
                if let Some(allowed) = map.get("allowed_rules") {
                    rule.allowed_rules = as_string_list("allowed_rules", allowed)?.into_iter().collect();
                }
                if let Some(always) = map.get("always_blanket_disable") {
                    rule.always_blanket_disable =
                        as_string_list("always_blanket_disable", always)?.into_iter().collect();
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

    fn reasons(rule: &BlanketDisableCommand, source: &str) -> Vec<String> {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file(source);
        rule.validate(&file, &RuleContext::new(&storage, &[], BLANKET_DISABLE_COMMAND.identifier))
            .into_iter()
            .map(|v| v.reason)
            .collect()
    }

    #[test]
    fn test_balanced_commands() {
        let rule = BlanketDisableCommand::default();
        assert!(reasons(&rule, "// swiftlint:disable unused_import\n// swiftlint:enable unused_import\n").is_empty());
        assert!(reasons(&rule, "// swiftlint:disable:next force_try\nlet a = try! b()\n").is_empty());
    }

    #[test]
    fn test_unbalanced_commands() {
        let rule = BlanketDisableCommand::default();
        assert_eq!(
            reasons(
                &rule,
                "// swiftlint:disable unused_import unused_declaration\n// swiftlint:enable unused_import\n"
            ),
            vec!["The disabled 'unused_declaration' rule should be re-enabled before the end of the file"]
        );
        assert_eq!(
            reasons(
                &rule,
                "// swiftlint:disable todo\n// swiftlint:disable todo\n// swiftlint:enable todo\n"
            ),
            vec!["The disabled 'todo' rule was already disabled"]
        );
        assert_eq!(
            reasons(&rule, "// swiftlint:enable todo\n"),
            vec!["The enabled 'todo' rule was not disabled"]
        );
    }

    #[test]
    fn test_allowed_rules_may_stay_disabled() {
        let rule = BlanketDisableCommand::default();
        assert!(reasons(&rule, "// swiftlint:disable file_length\n").is_empty());
    }

    #[test]
    fn test_always_blanket_disable() {
        let rule = BlanketDisableCommand::from_configuration(Some(
            &serde_yaml::from_str("always_blanket_disable: [file_length]").unwrap(),
        ))
        .unwrap();
        assert_eq!(
            reasons(&rule, "let a = 1 // swiftlint:disable:this file_length\n"),
            vec![
                "The 'file_length' rule applies to the whole file and thus cannot be disabled locally \
                 with 'previous', 'this' or 'next'"
            ]
        );
    }

    #[test]
    fn test_location_is_the_command() {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file("let a = 1\n// swiftlint:disable todo\n");
        let violations = BlanketDisableCommand::default()
            .validate(&file, &RuleContext::new(&storage, &[], BLANKET_DISABLE_COMMAND.identifier));
        assert_eq!(violations[0].location.line, Some(2));
    }
}
