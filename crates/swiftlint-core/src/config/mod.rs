//! Configuration loading and resolution.
//!
//! A [`Configuration`] is built from one or more YAML documents linked into
//! a [`FileGraph`]. Each document is parsed on its own, then the documents
//! are merged parent first, the child winning wherever both define a value.
//!
//! # Example
//!
//! ```yaml
//! parent_config: ../shared/.swiftlint.yml
//! disabled_rules:
//!   - todo
//! opt_in_rules:
//!   - empty_count
//! included:
//!   - Sources
//! excluded:
//!   - Sources/Generated
//! line_length:
//!   warning: 140
//!   error: 200
//! ```

mod document;
mod file_graph;
mod lintable;
mod nested;
mod remote;
mod resolver;
mod rules_mode;
mod rules_wrapper;
mod version;

pub use document::{expand_environment_variables, Document};
pub use file_graph::{FileGraph, Reference, Vertex};
pub use remote::{is_remote, load_remote, RemoteCache, RemoteFetcher, RemoteTimeouts};
pub use resolver::{ConfigurationResolver, ResolveOptions, DEFAULT_FILE_NAME};
pub use rules_mode::{RuleLists, RulesMode, CUSTOM_RULES};
pub use rules_wrapper::RulesWrapper;
pub use version::{check_current_version, check_version_constraint, CURRENT_VERSION};

use crate::catalog::RuleCatalog;
use crate::command::ALL_RULES;
use crate::issue::Issue;
use crate::rule::{Capabilities, SharedRule};
use crate::rule_configuration::{as_bool, as_string, as_string_list, as_usize};
use crate::session::LintSession;
use parking_lot::Mutex;
use serde_yaml::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Top-level keys that are not rule identifiers.
pub const GLOBAL_KEYS: &[&str] = &[
    "disabled_rules",
    "opt_in_rules",
    "enabled_rules",
    "only_rules",
    "analyzer_rules",
    "included",
    "excluded",
    "indentation",
    "warning_threshold",
    "reporter",
    "cache_path",
    "strict",
    "lenient",
    "baseline",
    "write_baseline",
    "allow_zero_lintable_files",
    "swiftlint_version",
    "parent_config",
    "child_config",
    "remote_timeout",
    "remote_timeout_if_cached",
];

/// Indentation style used by rules that care about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indentation {
    /// One tab per level.
    Tabs,
    /// This many spaces per level.
    Spaces(usize),
}

impl Default for Indentation {
    fn default() -> Self {
        Self::Spaces(4)
    }
}

/// Shared inputs of configuration resolution.
#[derive(Clone)]
pub struct ResolutionContext {
    /// Registered rules.
    pub catalog: Arc<RuleCatalog>,
    /// Warning de-duplication.
    pub session: Arc<LintSession>,
    /// Downloads remote documents.
    pub fetcher: Option<Arc<dyn RemoteFetcher>>,
    /// `--enable-all-rules`.
    pub enable_all_rules: bool,
    /// `--only-rule`, repeated.
    pub only_rule: Vec<String>,
}

impl ResolutionContext {
    /// Context without a fetcher or command-line overrides.
    #[must_use]
    pub fn new(catalog: Arc<RuleCatalog>, session: Arc<LintSession>) -> Self {
        Self {
            catalog,
            session,
            fetcher: None,
            enable_all_rules: false,
            only_rule: Vec::new(),
        }
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("rules", &self.catalog.len())
            .field("enable_all_rules", &self.enable_all_rules)
            .field("only_rule", &self.only_rule)
            .finish_non_exhaustive()
    }
}

/// The effective configuration of a run.
///
/// Immutable once resolved. Equality and hashing consider the identifiers of
/// the enabled rules and every scalar setting, not the YAML it came from.
#[derive(Clone)]
pub struct Configuration {
    rules_wrapper: RulesWrapper,
    included_paths: Vec<PathBuf>,
    excluded_paths: Vec<PathBuf>,
    indentation: Option<Indentation>,
    warning_threshold: Option<usize>,
    reporter: Option<String>,
    cache_path: Option<PathBuf>,
    strict: Option<bool>,
    lenient: Option<bool>,
    baseline: Option<PathBuf>,
    write_baseline: Option<PathBuf>,
    allow_zero_lintable_files: Option<bool>,
    root_directory: PathBuf,
    based_on_custom_configuration_files: bool,
    graph_files: Arc<BTreeSet<PathBuf>>,
    nested: Arc<Mutex<HashMap<PathBuf, Configuration>>>,
    context: Arc<ResolutionContext>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("rules", &self.rule_identifiers())
            .field("included_paths", &self.included_paths)
            .field("excluded_paths", &self.excluded_paths)
            .field("root_directory", &self.root_directory)
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Parses one document. Relative paths are resolved against `directory`.
    ///
    /// # Errors
    ///
    /// Returns an [`Issue`] for version mismatches, `only_rules` combined
    /// with other lists, and rules configured twice.
    pub fn from_document(
        document: &Document,
        directory: &Path,
        context: &Arc<ResolutionContext>,
    ) -> Result<Self, Issue> {
        let catalog = &context.catalog;
        validate_keys(document, catalog);

        if let Some(constraint) = document.get("swiftlint_version") {
            let constraint = match constraint {
                Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default(),
            };
            check_current_version(&constraint)?;
        }

        let mut opt_in_rules = string_list(document, "opt_in_rules");
        opt_in_rules.extend(string_list(document, "enabled_rules"));
        let lists = RuleLists {
            enable_all_rules: context.enable_all_rules,
            only_rule: context.only_rule.clone(),
            only_rules: string_list(document, "only_rules"),
            opt_in_rules,
            disabled_rules: string_list(document, "disabled_rules"),
            analyzer_rules: string_list(document, "analyzer_rules"),
        };
        warn_about_deprecated_list_entries(&lists, catalog);
        warn_about_misplaced_analyzer_rules(&lists.opt_in_rules, catalog);

        let mode = RulesMode::new(&lists, catalog)?;
        let all_rules_wrapped = catalog.all_rules_wrapped(document)?;
        let rules_wrapper = RulesWrapper::new(
            &mode,
            all_rules_wrapped,
            catalog.clone(),
            context.session.clone(),
        );
        warn_about_configured_rules_not_enabled(
            &rules_wrapper,
            catalog,
            document.get("parent_config").is_none(),
        );

        let paths = |key: &str| -> Vec<PathBuf> {
            string_list(document, key)
                .into_iter()
                .map(|p| normalize(&directory.join(p)))
                .collect()
        };

        Ok(Self {
            rules_wrapper,
            included_paths: paths("included"),
            excluded_paths: paths("excluded"),
            indentation: document.get("indentation").map(parse_indentation),
            warning_threshold: scalar(document, "warning_threshold", as_usize),
            reporter: scalar(document, "reporter", as_string),
            cache_path: scalar(document, "cache_path", as_string).map(PathBuf::from),
            strict: scalar(document, "strict", as_bool),
            lenient: scalar(document, "lenient", as_bool),
            baseline: scalar(document, "baseline", as_string).map(PathBuf::from),
            write_baseline: scalar(document, "write_baseline", as_string).map(PathBuf::from),
            allow_zero_lintable_files: scalar(document, "allow_zero_lintable_files", as_bool),
            root_directory: directory.to_path_buf(),
            based_on_custom_configuration_files: false,
            graph_files: Arc::new(BTreeSet::new()),
            nested: Arc::default(),
            context: context.clone(),
        })
    }

    /// The configuration used when no document exists.
    ///
    /// # Errors
    ///
    /// Only fails if the catalog cannot build a rule with its defaults.
    pub fn default_configuration(
        root_directory: &Path,
        context: &Arc<ResolutionContext>,
    ) -> Result<Self, Issue> {
        Self::from_document(&Document::default(), root_directory, context)
    }

    /// Applies `child` on top of this configuration.
    ///
    /// Path lists are combined, a path named by the child removing the same
    /// path from the parent's opposite list. Scalars come from the child when
    /// it defines them.
    #[must_use]
    pub fn merged(&self, child: &Self, root_directory: &Path) -> Self {
        let included_paths = self
            .included_paths
            .iter()
            .filter(|p| !child.excluded_paths.contains(p))
            .chain(&child.included_paths)
            .cloned()
            .collect();
        let excluded_paths = self
            .excluded_paths
            .iter()
            .filter(|p| !child.included_paths.contains(p))
            .chain(&child.excluded_paths)
            .cloned()
            .collect();
        let graph_files = self
            .graph_files
            .iter()
            .chain(child.graph_files.iter())
            .cloned()
            .collect();

        Self {
            rules_wrapper: self.rules_wrapper.merged(&child.rules_wrapper),
            included_paths,
            excluded_paths,
            indentation: child.indentation.or(self.indentation),
            warning_threshold: child.warning_threshold.or(self.warning_threshold),
            reporter: child.reporter.clone().or_else(|| self.reporter.clone()),
            cache_path: child.cache_path.clone().or_else(|| self.cache_path.clone()),
            strict: child.strict.or(self.strict),
            lenient: child.lenient.or(self.lenient),
            baseline: child.baseline.clone().or_else(|| self.baseline.clone()),
            write_baseline: child
                .write_baseline
                .clone()
                .or_else(|| self.write_baseline.clone()),
            allow_zero_lintable_files: child
                .allow_zero_lintable_files
                .or(self.allow_zero_lintable_files),
            root_directory: root_directory.to_path_buf(),
            based_on_custom_configuration_files: self.based_on_custom_configuration_files,
            graph_files: Arc::new(graph_files),
            nested: Arc::default(),
            context: self.context.clone(),
        }
    }

    /// Returns a copy rooted at another directory.
    #[must_use]
    pub fn with_root_directory(&self, root_directory: &Path) -> Self {
        Self {
            root_directory: root_directory.to_path_buf(),
            nested: Arc::default(),
            ..self.clone()
        }
    }

    pub(crate) fn with_graph(mut self, graph: &FileGraph, custom_files: bool) -> Self {
        self.graph_files = Arc::new(graph.local_files());
        self.based_on_custom_configuration_files = custom_files;
        self
    }

    /// The rules that run, sorted by identifier.
    pub fn rules(&self) -> &[SharedRule] {
        self.rules_wrapper.resulting_rules()
    }

    /// Identifiers of the rules that run.
    pub fn rule_identifiers(&self) -> Vec<&'static str> {
        self.rules().iter().map(|r| r.description().identifier).collect()
    }

    /// The enabled rule with this identifier.
    pub fn rule(&self, identifier: &str) -> Option<&SharedRule> {
        self.rules()
            .iter()
            .find(|r| r.description().identifier == identifier)
    }

    /// Configured rules and mode.
    #[must_use]
    pub fn rules_wrapper(&self) -> &RulesWrapper {
        &self.rules_wrapper
    }

    /// Identifiers of user-defined regex rules.
    #[must_use]
    pub fn custom_rule_identifiers(&self) -> Vec<String> {
        self.rules()
            .iter()
            .flat_map(|r| r.custom_identifiers())
            .collect()
    }

    /// Paths to lint when none are given.
    #[must_use]
    pub fn included_paths(&self) -> &[PathBuf] {
        &self.included_paths
    }

    /// Paths never linted.
    #[must_use]
    pub fn excluded_paths(&self) -> &[PathBuf] {
        &self.excluded_paths
    }

    /// Indentation style, four spaces unless configured.
    #[must_use]
    pub fn indentation(&self) -> Indentation {
        self.indentation.unwrap_or_default()
    }

    /// Number of warnings that fails the run.
    #[must_use]
    pub fn warning_threshold(&self) -> Option<usize> {
        self.warning_threshold
    }

    /// Identifier of the configured reporter.
    #[must_use]
    pub fn reporter(&self) -> Option<&str> {
        self.reporter.as_deref()
    }

    /// Directory of the violation cache.
    #[must_use]
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Whether warnings are reported as errors.
    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    /// Whether errors are reported as warnings.
    #[must_use]
    pub fn lenient(&self) -> bool {
        self.lenient.unwrap_or(false)
    }

    /// Baseline to filter against.
    #[must_use]
    pub fn baseline(&self) -> Option<&Path> {
        self.baseline.as_deref()
    }

    /// Baseline to write.
    #[must_use]
    pub fn write_baseline(&self) -> Option<&Path> {
        self.write_baseline.as_deref()
    }

    /// Whether finding nothing to lint is acceptable.
    #[must_use]
    pub fn allow_zero_lintable_files(&self) -> bool {
        self.allow_zero_lintable_files.unwrap_or(false)
    }

    /// Directory the configuration applies to.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Registered rules.
    #[must_use]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.context.catalog
    }

    /// Warning de-duplication shared with the pipeline.
    #[must_use]
    pub fn session(&self) -> &LintSession {
        &self.context.session
    }

    /// Digest of the enabled rules, their settings, and every scalar.
    ///
    /// Cached violations are only reused under an identical fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for rule in self.rules() {
            hasher.update(rule.description().identifier.as_bytes());
            hasher.update(b"=");
            hasher.update(rule.configuration_description().one_line().as_bytes());
            for custom in rule.custom_identifiers() {
                hasher.update(b"+");
                hasher.update(custom.as_bytes());
            }
            hasher.update(b"\n");
        }
        hasher.update(format!("{:?}", self.scalars()).as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    #[allow(clippy::type_complexity)]
    fn scalars(
        &self,
    ) -> (
        &[PathBuf],
        &[PathBuf],
        Indentation,
        Option<usize>,
        Option<&str>,
        Option<&Path>,
        (bool, bool, Option<&Path>, Option<&Path>, bool, &Path),
    ) {
        (
            &self.included_paths,
            &self.excluded_paths,
            self.indentation(),
            self.warning_threshold,
            self.reporter(),
            self.cache_path(),
            (
                self.strict(),
                self.lenient(),
                self.baseline(),
                self.write_baseline(),
                self.allow_zero_lintable_files(),
                &self.root_directory,
            ),
        )
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.rule_identifiers() == other.rule_identifiers() && self.scalars() == other.scalars()
    }
}

impl Eq for Configuration {}

impl Hash for Configuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule_identifiers().hash(state);
        self.scalars().hash(state);
    }
}

/// Lexically resolves `.` and `..` components.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn string_list(document: &Document, key: &str) -> Vec<String> {
    match document.get(key).map(|v| as_string_list(key, v)) {
        None => Vec::new(),
        Some(Ok(list)) => list,
        Some(Err(error)) => {
            Issue::InvalidConfiguration {
                rule_id: key.to_string(),
                reason: Some(error.to_string()),
            }
            .print();
            Vec::new()
        }
    }
}

fn scalar<T, E: fmt::Display>(
    document: &Document,
    key: &str,
    read: impl Fn(&str, &Value) -> Result<T, E>,
) -> Option<T> {
    let value = document.get(key)?;
    match read(key, value) {
        Ok(value) => Some(value),
        Err(error) => {
            Issue::InvalidConfiguration {
                rule_id: key.to_string(),
                reason: Some(error.to_string()),
            }
            .print();
            None
        }
    }
}

fn parse_indentation(value: &Value) -> Indentation {
    match value {
        Value::String(s) if s == "tabs" || s == "tab" => Indentation::Tabs,
        Value::Number(n) => match n.as_u64().and_then(|n| usize::try_from(n).ok()) {
            Some(spaces) => Indentation::Spaces(spaces),
            None => invalid_indentation(),
        },
        _ => invalid_indentation(),
    }
}

fn invalid_indentation() -> Indentation {
    Issue::InvalidConfiguration {
        rule_id: "indentation".to_string(),
        reason: None,
    }
    .print();
    Indentation::default()
}

fn validate_keys(document: &Document, catalog: &RuleCatalog) {
    let mut invalid = BTreeSet::new();
    for key in document.keys() {
        if key == "enabled_rules" {
            Issue::RenamedIdentifier {
                old: key.to_string(),
                new: "opt_in_rules".to_string(),
            }
            .print();
        } else if GLOBAL_KEYS.contains(&key) {
            continue;
        } else if let Some(identifier) = catalog.identifier_for(key) {
            if identifier != key {
                Issue::RenamedIdentifier {
                    old: key.to_string(),
                    new: identifier.to_string(),
                }
                .print();
            }
        } else {
            invalid.insert(key.to_string());
        }
    }
    if !invalid.is_empty() {
        Issue::InvalidConfigurationKeys {
            keys: invalid.into_iter().collect(),
        }
        .print();
    }
}

fn warn_about_deprecated_list_entries(lists: &RuleLists, catalog: &RuleCatalog) {
    let entries = lists
        .only_rules
        .iter()
        .chain(&lists.opt_in_rules)
        .chain(&lists.disabled_rules)
        .chain(&lists.analyzer_rules);
    let mut reported = BTreeSet::new();
    for entry in entries {
        if let Some(identifier) = catalog.identifier_for(entry) {
            if identifier != entry && reported.insert(entry.clone()) {
                Issue::RenamedIdentifier {
                    old: entry.clone(),
                    new: identifier.to_string(),
                }
                .print();
            }
        }
    }
}

fn warn_about_misplaced_analyzer_rules(opt_in_rules: &[String], catalog: &RuleCatalog) {
    for id in opt_in_rules.iter().filter(|id| id.as_str() != ALL_RULES) {
        if catalog
            .description(id)
            .is_some_and(|d| d.has(Capabilities::ANALYZER_ONLY))
        {
            Issue::MisplacedAnalyzerRule {
                rule_id: id.clone(),
            }
            .print();
        }
    }
}

fn warn_about_configured_rules_not_enabled(
    wrapper: &RulesWrapper,
    catalog: &RuleCatalog,
    is_top_level: bool,
) {
    for configured in wrapper.all_rules_wrapped().iter().filter(|r| r.configured) {
        let id = configured.identifier();
        let reason = match wrapper.mode() {
            RulesMode::Only(only) if !only.contains(id) => Some("it is not present on 'only_rules'"),
            RulesMode::Default { disabled, opt_in } => {
                let is_opt_in = catalog
                    .description(id)
                    .is_some_and(|d| d.has(Capabilities::OPT_IN));
                if disabled.contains(id) {
                    Some("it is disabled on 'disabled_rules'")
                } else if is_opt_in && !opt_in.contains(id) && is_top_level {
                    Some("it is not enabled on 'opt_in_rules'")
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(reason) = reason {
            Issue::ConfiguredRuleNotEnabled {
                rule_id: id.to_string(),
                reason: reason.to_string(),
            }
            .print();
        }
    }
}
