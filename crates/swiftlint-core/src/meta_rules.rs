//! Rules that report problems with inline commands themselves.
//!
//! Both live in the engine because they need the region machinery. The
//! superfluous-disable rule does nothing in `validate`: the pipeline finds it
//! among the enabled rules and asks it to build violations while partitioning.

use crate::command::{Action, Command, Modifier};
use crate::file::SourceFile;
use crate::rule::{
    Capabilities, ConfigurableRule, Rule, RuleContext, RuleDescription, RuleKind, SwiftVersion,
};
use crate::rule_configuration::{
    ConfigurationDescription, RuleConfigurationError, SeverityConfiguration,
};
use crate::types::{Location, Severity, StyleViolation};
use serde_yaml::Value;
use std::any::Any;

/// Metadata of [`SuperfluousDisableCommandRule`].
pub static SUPERFLUOUS_DISABLE_COMMAND: RuleDescription = RuleDescription {
    identifier: "superfluous_disable_command",
    name: "Superfluous Disable Command",
    description: "Disable commands are superfluous when the disabled rule would not have \
                  triggered a violation in the disabled region. Use \" - \" if you wish to \
                  document a command.",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::SOURCEKIT_FREE,
};

/// Reports disable commands that suppress nothing or name unknown rules.
#[derive(Debug, Clone)]
pub struct SuperfluousDisableCommandRule {
    configuration: SeverityConfiguration,
}

impl SuperfluousDisableCommandRule {
    /// Severity of emitted violations.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.configuration.severity
    }

    /// Violation for a region disabling `identifier` without suppressing
    /// anything.
    #[must_use]
    pub fn superfluous_violation(&self, identifier: &str, location: Location) -> StyleViolation {
        self.violation(
            location,
            format!(
                "SwiftLint rule '{identifier}' did not trigger a violation in the disabled region; \
                 remove the disable command"
            ),
        )
    }

    /// Violation for a disable command naming an identifier no rule has.
    #[must_use]
    pub fn non_existent_rule_violation(&self, identifier: &str, location: Location) -> StyleViolation {
        self.violation(
            location,
            format!("'{identifier}' is not a valid SwiftLint rule; remove it from the disable command"),
        )
    }

    fn violation(&self, location: Location, reason: String) -> StyleViolation {
        StyleViolation::new(
            SUPERFLUOUS_DISABLE_COMMAND.identifier,
            SUPERFLUOUS_DISABLE_COMMAND.name,
            self.configuration.severity,
            location,
            reason,
        )
    }
}

impl Rule for SuperfluousDisableCommandRule {
    fn description(&self) -> &'static RuleDescription {
        &SUPERFLUOUS_DISABLE_COMMAND
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn validate(&self, _file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for SuperfluousDisableCommandRule {
    const DESCRIPTION: &'static RuleDescription = &SUPERFLUOUS_DISABLE_COMMAND;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut severity = SeverityConfiguration::new(Severity::Warning);
        if let Some(value) = configuration {
            severity.apply(value)?;
        }
        Ok(Self {
            configuration: severity,
        })
    }
}

/// Metadata of [`InvalidCommandRule`].
pub static INVALID_SWIFTLINT_COMMAND: RuleDescription = RuleDescription {
    identifier: "invalid_swiftlint_command",
    name: "Invalid SwiftLint Command",
    description: "swiftlint(disable|enable) commands should have a valid action, an optional \
                  modifier and at least one rule identifier",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::SOURCEKIT_FREE,
};

/// Reports inline commands that could not be understood.
#[derive(Debug, Clone)]
pub struct InvalidCommandRule {
    configuration: SeverityConfiguration,
}

impl InvalidCommandRule {
    fn reason(command: &Command) -> &'static str {
        if command.action == Action::Invalid {
            "swiftlint command does not have a valid action"
        } else if command.modifier == Some(Modifier::Invalid) {
            "swiftlint command does not have a valid modifier"
        } else {
            "swiftlint command does not specify any rules"
        }
    }
}

impl Rule for InvalidCommandRule {
    fn description(&self) -> &'static RuleDescription {
        &INVALID_SWIFTLINT_COMMAND
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        file.invalid_commands()
            .into_iter()
            .map(|command| {
                StyleViolation::new(
                    INVALID_SWIFTLINT_COMMAND.identifier,
                    INVALID_SWIFTLINT_COMMAND.name,
                    self.configuration.severity,
                    Location::from_parts(
                        file.path().map(std::path::Path::to_path_buf),
                        Some(command.line),
                        command.character,
                    ),
                    Self::reason(command),
                )
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for InvalidCommandRule {
    const DESCRIPTION: &'static RuleDescription = &INVALID_SWIFTLINT_COMMAND;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let mut severity = SeverityConfiguration::new(Severity::Warning);
        if let Some(value) = configuration {
            severity.apply(value)?;
        }
        Ok(Self {
            configuration: severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RuleStorage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_command_reasons() {
        let file = SourceFile::virtual_file(
            "// swiftlint:disbale force_try\n// swiftlint:disable:nxt force_try\n// swiftlint:enable\n",
        );
        let rule = InvalidCommandRule::from_configuration(None).unwrap();
        let storage = RuleStorage::new();
        let ctx = RuleContext::new(&storage, &[], rule.description().identifier);
        let reasons: Vec<(Option<usize>, String)> = rule
            .validate(&file, &ctx)
            .into_iter()
            .map(|v| (v.location.line, v.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (Some(1), "swiftlint command does not have a valid action".to_string()),
                (Some(2), "swiftlint command does not have a valid modifier".to_string()),
                (Some(3), "swiftlint command does not specify any rules".to_string()),
            ]
        );
    }

    #[test]
    fn test_superfluous_reasons() {
        let rule = SuperfluousDisableCommandRule::from_configuration(Some(&Value::from("error"))).unwrap();
        let violation = rule.non_existent_rule_violation("nope", Location::line(None, 1));
        assert_eq!(violation.severity, Severity::Error);
        assert_eq!(
            violation.reason,
            "'nope' is not a valid SwiftLint rule; remove it from the disable command"
        );
        assert_eq!(violation.rule_identifier, "superfluous_disable_command");
    }
}
