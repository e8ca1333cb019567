//! Rule trait and rule metadata.

use crate::file::SourceFile;
use crate::rule_configuration::{ConfigurationDescription, RuleConfigurationError};
use crate::storage::RuleStorage;
use crate::types::{Correction, StyleViolation};
use std::any::Any;
use std::fmt;
use std::ops::BitOr;
use std::path::PathBuf;
use std::sync::Arc;

/// Broad category of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Catches likely bugs.
    Lint,
    /// Enforces idiomatic usage.
    Idiomatic,
    /// Enforces formatting and style.
    Style,
    /// Enforces size limits.
    Metrics,
    /// Reports performance pitfalls.
    Performance,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lint => "lint",
            Self::Idiomatic => "idiomatic",
            Self::Style => "style",
            Self::Metrics => "metrics",
            Self::Performance => "performance",
        };
        f.write_str(name)
    }
}

/// A language version, compared component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwiftVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl SwiftVersion {
    /// The lowest version any rule can require.
    pub const FIVE: Self = Self::new(5, 0, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SwiftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Capability markers of a rule, as a small bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// The rule can rewrite the file to fix its violations.
    pub const CORRECTABLE: Self = Self(1);
    /// The rule needs compiler arguments and only runs under `analyze`.
    pub const ANALYZER_ONLY: Self = Self(1 << 1);
    /// The rule gathers information from every file before validating.
    pub const COLLECTING: Self = Self(1 << 2);
    /// The rule does not depend on the tokenizer succeeding.
    pub const SOURCEKIT_FREE: Self = Self(1 << 3);
    /// The rule is disabled unless explicitly enabled.
    pub const OPT_IN: Self = Self(1 << 4);

    /// Returns `true` if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Const-friendly union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Static metadata describing a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescription {
    /// Stable identifier used in configuration and commands.
    pub identifier: &'static str,
    /// Human readable name.
    pub name: &'static str,
    /// What the rule checks.
    pub description: &'static str,
    /// Category.
    pub kind: RuleKind,
    /// Former identifiers still accepted with a warning.
    pub deprecated_aliases: &'static [&'static str],
    /// Lowest language version the rule applies to.
    pub min_swift_version: SwiftVersion,
    /// Capability markers.
    pub capabilities: Capabilities,
}

impl RuleDescription {
    /// The identifier followed by every deprecated alias.
    pub fn all_identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.identifier).chain(self.deprecated_aliases.iter().copied())
    }

    /// Returns `true` if the rule carries every flag of `capability`.
    #[must_use]
    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Per-file information produced by a rule's collect phase.
pub type CollectedInfo = Arc<dyn Any + Send + Sync>;

/// Everything a rule may consult while running, besides the file itself.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// Storage filled by the collect phase.
    pub storage: &'a RuleStorage,
    /// Compiler arguments for analyzer rules. Empty when linting.
    pub compiler_arguments: &'a [String],
    /// Identifier of the rule being executed.
    pub rule_identifier: &'a str,
}

impl<'a> RuleContext<'a> {
    /// Creates a context for one rule.
    #[must_use]
    pub fn new(
        storage: &'a RuleStorage,
        compiler_arguments: &'a [String],
        rule_identifier: &'a str,
    ) -> Self {
        Self {
            storage,
            compiler_arguments,
            rule_identifier,
        }
    }

    /// Everything the executing rule collected, across all files.
    #[must_use]
    pub fn collected<T: Any + Send + Sync>(&self) -> Vec<(PathBuf, Arc<T>)> {
        self.storage.collected_as::<T>(self.rule_identifier)
    }
}

/// A lint rule.
///
/// Rules are configured once during configuration resolution and are
/// read-only afterwards. Anything a rule needs to remember across files
/// goes through [`RuleStorage`], never through interior mutability.
///
/// # Example
///
/// ```ignore
/// use swiftlint_core::{Rule, RuleContext, RuleDescription, SourceFile, StyleViolation};
///
/// struct NoSemicolons { severity: Severity }
///
/// impl Rule for NoSemicolons {
///     fn description(&self) -> &'static RuleDescription { &DESCRIPTION }
///     fn configuration_description(&self) -> ConfigurationDescription {
///         ConfigurationDescription::new().severity(self.severity)
///     }
///     fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
///         file.lines().filter(|l| l.content.ends_with(';')).map(|l| /* ... */).collect()
///     }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Rule: Send + Sync + 'static {
    /// Static metadata of the rule.
    fn description(&self) -> &'static RuleDescription;

    /// Describes the current configuration as ordered key/value pairs.
    fn configuration_description(&self) -> ConfigurationDescription;

    /// Checks a file and returns its violations.
    fn validate(&self, file: &SourceFile, ctx: &RuleContext<'_>) -> Vec<StyleViolation>;

    /// Gathers information about a file ahead of validation.
    ///
    /// Only called for rules with [`Capabilities::COLLECTING`]. The returned
    /// value is stored under this rule's identifier.
    fn collect(&self, _file: &SourceFile, _ctx: &RuleContext<'_>) -> Option<CollectedInfo> {
        None
    }

    /// Rewrites the contents of a file to fix violations.
    ///
    /// Returns the new contents and the corrections applied, or `None` if
    /// there was nothing to correct.
    fn correct(
        &self,
        _file: &SourceFile,
        _ctx: &RuleContext<'_>,
    ) -> Option<(String, Vec<Correction>)> {
        None
    }

    /// Extra identifiers addressable in commands, such as custom rule names.
    fn custom_identifiers(&self) -> Vec<String> {
        Vec::new()
    }

    /// Merges this rule with the configured instance of a child configuration.
    ///
    /// Returns `None` to let the child instance replace this one.
    fn merged_with_child(&self, _child: &dyn Rule) -> Option<SharedRule> {
        None
    }

    /// Returns a copy restricted to the given custom identifiers.
    ///
    /// Returns `None` if the rule has no custom identifiers to restrict.
    fn restricted_to(&self, _identifiers: &dyn Fn(&str) -> bool) -> Option<SharedRule> {
        None
    }

    /// Upcast for downcasting to a concrete rule.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a configured rule.
pub type SharedRule = Arc<dyn Rule>;

/// A rule that can be built from its YAML configuration.
pub trait ConfigurableRule: Rule + Sized {
    /// Static metadata of the rule.
    const DESCRIPTION: &'static RuleDescription;

    /// Builds the rule. `None` yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be applied.
    fn from_configuration(
        configuration: Option<&serde_yaml::Value>,
    ) -> Result<Self, RuleConfigurationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static DESCRIPTION: RuleDescription = RuleDescription {
        identifier: "new_name",
        name: "New Name",
        description: "A renamed rule",
        kind: RuleKind::Style,
        deprecated_aliases: &["old_name", "older_name"],
        min_swift_version: SwiftVersion::FIVE,
        capabilities: Capabilities::OPT_IN.union(Capabilities::CORRECTABLE),
    };

    #[test]
    fn test_all_identifiers() {
        let ids: Vec<&str> = DESCRIPTION.all_identifiers().collect();
        assert_eq!(ids, vec!["new_name", "old_name", "older_name"]);
    }

    #[test]
    fn test_capabilities() {
        assert!(DESCRIPTION.has(Capabilities::OPT_IN));
        assert!(DESCRIPTION.has(Capabilities::CORRECTABLE));
        assert!(!DESCRIPTION.has(Capabilities::ANALYZER_ONLY));
        assert!(DESCRIPTION.has(Capabilities::OPT_IN | Capabilities::CORRECTABLE));
        assert!(Capabilities::NONE.contains(Capabilities::NONE));
    }

    #[test]
    fn test_swift_version_ordering() {
        assert!(SwiftVersion::new(5, 9, 0) > SwiftVersion::FIVE);
        assert!(SwiftVersion::new(5, 10, 0) > SwiftVersion::new(5, 9, 2));
        assert_eq!(SwiftVersion::new(6, 0, 1).to_string(), "6.0.1");
    }
}
