//! Rule to forbid `as!`.
//!
//! # Configuration
//!
//! - `severity`: `warning` or `error` (default: `error`)

use crate::utils::{code_matches, severity_only, static_regex, violation_at};
use serde_yaml::Value;
use std::any::Any;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{RuleConfigurationError, SeverityConfiguration};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`ForceCast`].
pub static FORCE_CAST: RuleDescription = RuleDescription {
    identifier: "force_cast",
    name: "Force Cast",
    description: "Force casts should be avoided",
    kind: RuleKind::Idiomatic,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

/// Flags every `as!` outside comments and strings.
#[derive(Debug, Clone)]
pub struct ForceCast {
    configuration: SeverityConfiguration,
}

impl Default for ForceCast {
    fn default() -> Self {
        Self {
            configuration: SeverityConfiguration::new(Severity::Error),
        }
    }
}

impl Rule for ForceCast {
    fn description(&self) -> &'static RuleDescription {
        &FORCE_CAST
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
        let Some(pattern) = static_regex(&PATTERN, r"\bas!") else {
            return Vec::new();
        };
        code_matches(file, pattern)
            .map(|offset| {
                violation_at(
                    &FORCE_CAST,
                    self.configuration.severity,
                    file,
                    offset,
                    FORCE_CAST.description,
                )
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for ForceCast {
    const DESCRIPTION: &'static RuleDescription = &FORCE_CAST;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        Ok(Self {
            configuration: severity_only(configuration, Severity::Error)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swiftlint_core::RuleStorage;

    fn lint(source: &str) -> Vec<StyleViolation> {
        let storage = RuleStorage::new();
        let file = SourceFile::virtual_file(source);
        ForceCast::default().validate(&file, &RuleContext::new(&storage, &[], FORCE_CAST.identifier))
    }

    #[test]
    fn test_detects_force_cast() {
        let violations = lint("let view = cell as! UIView\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.character, Some(17));
        assert_eq!(violations[0].severity, Severity::Error);
    }

    #[test]
    fn test_conditional_cast_is_fine() {
        assert!(lint("let view = cell as? UIView\nlet any = cell as Any\n").is_empty());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(ForceCast::from_configuration(Some(&Value::from("fatal"))).is_err());
    }
}
