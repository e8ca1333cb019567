//! Rule to forbid `try!`.
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

/// Metadata of [`ForceTry`].
pub static FORCE_TRY: RuleDescription = RuleDescription {
    identifier: "force_try",
    name: "Force Try",
    description: "Force tries should be avoided",
    kind: RuleKind::Idiomatic,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

/// Flags every `try!` outside comments and strings.
#[derive(Debug, Clone)]
pub struct ForceTry {
    configuration: SeverityConfiguration,
}

impl Default for ForceTry {
    fn default() -> Self {
        Self {
            configuration: SeverityConfiguration::new(Severity::Error),
        }
    }
}

impl Rule for ForceTry {
    fn description(&self) -> &'static RuleDescription {
        &FORCE_TRY
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
        let Some(pattern) = static_regex(&PATTERN, r"\btry!") else {
            return Vec::new();
        };
        code_matches(file, pattern)
            .map(|offset| {
                violation_at(
                    &FORCE_TRY,
                    self.configuration.severity,
                    file,
                    offset,
                    FORCE_TRY.description,
                )
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for ForceTry {
    const DESCRIPTION: &'static RuleDescription = &FORCE_TRY;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        Ok(Self {
            configuration: severity_only(configuration, Severity::Error)?,
        })
    }
}
