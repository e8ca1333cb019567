//! # swiftlint-core
//!
//! Engine of the SwiftLint linter for Swift sources.
//!
//! This crate resolves configuration and runs rules. It includes:
//!
//! - [`ConfigurationResolver`] for merging `.swiftlint.yml` files into one
//!   [`Configuration`]
//! - [`Command`] and [`Region`] for `// swiftlint:disable` style suppression
//! - [`Linter`] for the collect and validate phases over one file
//! - [`LinterCache`] for reusing violations across runs
//! - [`Baseline`] for hiding known violations
//! - [`Rule`] and [`RuleCatalog`] for plugging rules in
//!
//! ## Example
//!
//! ```ignore
//! use swiftlint_core::{ConfigurationResolver, Linter, LintSession, ResolveOptions, RuleStorage, SourceFile};
//!
//! let resolver = ConfigurationResolver::new(catalog, Arc::new(LintSession::new()));
//! let configuration = resolver.resolve(&ResolveOptions::new(&root))?;
//! let storage = RuleStorage::new();
//!
//! for path in configuration.lintable_files(&[], false, false) {
//!     let file = SourceFile::read(&path)?;
//!     let local = configuration.configuration_for_file(&path);
//!     let violations = Linter::new(file, &local, None, Vec::new())
//!         .collect(&storage)
//!         .style_violations();
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod baseline;
mod cache;
mod catalog;
mod command;
mod config;
mod file;
mod issue;
mod linter;
mod meta_rules;
mod parser;
mod region;
mod reporter;
mod rule;
mod session;
mod storage;
mod types;

/// Rule configuration values and parsing helpers.
pub mod rule_configuration;

pub use baseline::{Baseline, BaselineError, BaselineViolation};
pub use cache::{CacheEntry, CacheError, LinterCache, CACHE_FILE_NAME};
pub use catalog::{ConfiguredRule, RuleCatalog, RuleFactory};
pub use command::{Action, Command, Modifier, ALL_RULES, COMMAND_PREFIX};
pub use config::{
    check_current_version, check_version_constraint, expand_environment_variables, is_remote,
    load_remote, normalize, Configuration, ConfigurationResolver, Document, FileGraph,
    Indentation, Reference, RemoteCache, RemoteFetcher, RemoteTimeouts, ResolutionContext,
    ResolveOptions, RuleLists, RulesMode, RulesWrapper, Vertex, CURRENT_VERSION, CUSTOM_RULES,
    DEFAULT_FILE_NAME, GLOBAL_KEYS,
};
pub use file::{Line, SourceFile};
pub use issue::Issue;
pub use linter::{CollectedLinter, Linter, RuleTime, DEFAULT_SWIFT_VERSION};
pub use meta_rules::{
    InvalidCommandRule, SuperfluousDisableCommandRule, INVALID_SWIFTLINT_COMMAND,
    SUPERFLUOUS_DISABLE_COMMAND,
};
pub use parser::{ParseError, SwiftTokenizer, Token, TokenKind, Tokenizer};
pub use region::{build_regions, build_regions_restricted, Region};
pub use reporter::{
    reporter_for, reporters, JsonReporter, Reporter, SummaryReporter, XcodeReporter,
    DEFAULT_REPORTER,
};
pub use rule::{
    Capabilities, CollectedInfo, ConfigurableRule, Rule, RuleContext, RuleDescription, RuleKind,
    SharedRule, SwiftVersion,
};
pub use rule_configuration::{ConfigurationDescription, RuleConfigurationError};
pub use session::LintSession;
pub use storage::RuleStorage;
pub use types::{sort_violations, Correction, Location, Severity, StyleViolation};
