//! Problems found while resolving configuration or running the pipeline.
//!
//! Recoverable issues are printed to standard error through `tracing` and
//! execution continues. Fatal ones are returned as `Err` and rendered by the
//! caller.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong outside of rule logic.
#[derive(Debug, Error, Diagnostic)]
pub enum Issue {
    /// A rule configuration could not be applied.
    #[error("Invalid configuration for '{rule_id}' rule{}. Falling back to default.", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    #[diagnostic(code(swiftlint::config::invalid_rule_configuration))]
    InvalidConfiguration {
        /// Rule identifier, or a global key such as `indentation`.
        rule_id: String,
        /// What was wrong, if known.
        reason: Option<String>,
    },

    /// The document contains unknown top-level keys.
    #[error("Configuration contains invalid keys {}.", format_list(.keys))]
    #[diagnostic(code(swiftlint::config::invalid_keys))]
    InvalidConfigurationKeys {
        /// Unknown keys, sorted.
        keys: Vec<String>,
    },

    /// A rule list names an identifier more than once.
    #[error("'{rule_id}' is listed {times} times in the configuration.")]
    #[diagnostic(code(swiftlint::config::listed_multiple_times))]
    ListedMultipleTimes {
        /// Rule identifier.
        rule_id: String,
        /// Number of occurrences.
        times: usize,
    },

    /// An identifier or key was renamed.
    #[error("'{old}' has been renamed to '{new}' and will be completely removed in a future release.")]
    #[diagnostic(code(swiftlint::config::renamed_identifier))]
    RenamedIdentifier {
        /// Deprecated spelling.
        old: String,
        /// Current spelling.
        new: String,
    },

    /// A rule list names identifiers no rule has.
    #[error("'{rule_id}' is not a valid rule identifier")]
    #[diagnostic(code(swiftlint::config::invalid_rule_identifier))]
    InvalidRuleIdentifier {
        /// The unknown identifier.
        rule_id: String,
    },

    /// A rule is configured under its identifier and an alias, or twice.
    #[error("Multiple configurations found for '{rule_id}'. Check for any aliases: {}.", .aliases.iter().map(|a| format!("'{a}'")).collect::<Vec<_>>().join(", "))]
    #[diagnostic(
        code(swiftlint::config::duplicated_configurations),
        help("Keep a single configuration entry per rule.")
    )]
    DuplicatedConfigurations {
        /// Rule identifier.
        rule_id: String,
        /// Deprecated aliases of the rule.
        aliases: Vec<String>,
    },

    /// `only_rules` combined with `disabled_rules` or `opt_in_rules`.
    #[error("'disabled_rules' or 'opt_in_rules' cannot be used in combination with 'only_rules'")]
    #[diagnostic(code(swiftlint::config::only_rules_combined))]
    OnlyRulesCombined,

    /// A rule has configuration but the rules mode leaves it disabled.
    #[error("Found a configuration for '{rule_id}' rule, but {reason}.")]
    #[diagnostic(code(swiftlint::config::configured_rule_not_enabled))]
    ConfiguredRuleNotEnabled {
        /// Rule identifier.
        rule_id: String,
        /// Which setting disables it.
        reason: String,
    },

    /// An analyzer rule was listed under `opt_in_rules`.
    #[error("'{rule_id}' should be listed in the 'analyzer_rules' configuration section for more clarity as it is only run by 'swiftlint analyze'.")]
    #[diagnostic(code(swiftlint::config::misplaced_analyzer_rule))]
    MisplacedAnalyzerRule {
        /// Rule identifier.
        rule_id: String,
    },

    /// The explicitly requested configuration file does not exist.
    #[error("Could not read file at path '{}'.", .path.display())]
    #[diagnostic(code(swiftlint::config::initial_file_not_found))]
    InitialFileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// A referenced configuration file does not exist.
    #[error("File at path '{}' not found.", .path.display())]
    #[diagnostic(code(swiftlint::config::file_not_found))]
    FileNotFound {
        /// Referenced path.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("Cannot open or read file at path '{}': {source}", .path.display())]
    #[diagnostic(code(swiftlint::io::file_not_readable))]
    FileNotReadable {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("Cannot write to file at path '{}': {source}", .path.display())]
    #[diagnostic(code(swiftlint::io::file_not_writable))]
    FileNotWritable {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration document is not valid YAML.
    #[error("Cannot parse YAML file: {message}")]
    #[diagnostic(code(swiftlint::config::yaml_parsing))]
    YamlParsing {
        /// Parser message.
        message: String,
    },

    /// The configuration graph contains a cycle.
    #[error("There's a cycle of child / parent config references. Please check the hierarchy of configuration files passed via the command line and the child_config / parent_config entries within them.")]
    #[diagnostic(code(swiftlint::config::cycle))]
    CyclicConfigurationGraph,

    /// A configuration has more than one parent or child.
    #[error("There's an ambiguity in the child / parent configuration tree: More than one {relation} is declared for a specific configuration, where there should only be exactly one.")]
    #[diagnostic(code(swiftlint::config::ambiguous_graph))]
    AmbiguousConfigurationGraph {
        /// `parent` or `child`.
        relation: &'static str,
    },

    /// A remote configuration referenced a local file.
    #[error("Remote configs are not allowed to reference local configs.")]
    #[diagnostic(code(swiftlint::config::remote_references_local))]
    RemoteReferencesLocal,

    /// A remote configuration could not be fetched and is not cached.
    #[error("Unable to load remote config from '{url}': {message}")]
    #[diagnostic(
        code(swiftlint::config::remote_unavailable),
        help("Check your connection or the URL; a cached copy is used when one exists.")
    )]
    RemoteConfigUnavailable {
        /// Remote URL.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// `swiftlint_version` is not a valid constraint.
    #[error("swiftlint_version syntax invalid: '{value}'. Please specify a version as follows: 0.54.0, >0.54.0, >=0.54.0, <0.54.0, <=0.54.0")]
    #[diagnostic(code(swiftlint::config::malformed_version))]
    MalformedVersionConstraint {
        /// The constraint as written.
        value: String,
    },

    /// The running version does not satisfy `swiftlint_version`.
    #[error("Currently running SwiftLint {running} but configuration specified {relation} {required}.")]
    #[diagnostic(code(swiftlint::config::version_mismatch))]
    VersionMismatch {
        /// Version of this tool.
        running: String,
        /// `at least`, `greater than`, `at most`, `less than` or `exactly`.
        relation: &'static str,
        /// Version from the constraint.
        required: String,
    },

    /// The baseline file could not be read.
    #[error("Cannot open or read the baseline file at path '{}'.", .path.display())]
    #[diagnostic(code(swiftlint::baseline::not_readable))]
    BaselineNotReadable {
        /// Path of the baseline.
        path: PathBuf,
    },

    /// Any other warning.
    #[error("{0}")]
    #[diagnostic(code(swiftlint::warning))]
    Generic(String),
}

impl Issue {
    /// Prints the issue as a warning on standard error.
    pub fn print(&self) {
        tracing::warn!("{self}");
    }

    /// Returns `true` for issues that stop resolution of an explicitly
    /// requested configuration.
    #[must_use]
    pub fn is_initial_file_not_found(&self) -> bool {
        matches!(self, Self::InitialFileNotFound { .. })
    }

    /// Returns `true` for issues that are fatal even when falling back to
    /// the default configuration would be possible.
    #[must_use]
    pub fn is_always_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicatedConfigurations { .. }
                | Self::VersionMismatch { .. }
                | Self::MalformedVersionConstraint { .. }
        )
    }
}

fn format_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("'{i}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
