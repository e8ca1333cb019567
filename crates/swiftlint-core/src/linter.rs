//! Per-file lint pipeline.
//!
//! Linting a file happens in two steps so that rules can look at every file
//! before reporting on any of them:
//!
//! 1. [`Linter::collect`] runs the collect phase of collecting rules,
//!    filling the shared [`RuleStorage`].
//! 2. [`CollectedLinter::style_violations`] consults the cache, runs every
//!    rule's validation and keeps the violations no region suppresses.
//!
//! # Example
//!
//! ```ignore
//! let storage = RuleStorage::new();
//! let linters: Vec<_> = files
//!     .into_iter()
//!     .map(|file| Linter::new(file, &configuration, Some(&cache), Vec::new()).collect(&storage))
//!     .collect();
//! let violations: Vec<_> = linters.iter().flat_map(CollectedLinter::style_violations).collect();
//! ```

use crate::cache::LinterCache;
use crate::command::ALL_RULES;
use crate::config::Configuration;
use crate::file::SourceFile;
use crate::issue::Issue;
use crate::meta_rules::{SuperfluousDisableCommandRule, SUPERFLUOUS_DISABLE_COMMAND};
use crate::region::Region;
use crate::rule::{Capabilities, Rule, RuleContext, SharedRule, SwiftVersion};
use crate::storage::RuleStorage;
use crate::types::{Correction, StyleViolation};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::debug;

/// Language version rules are checked against unless told otherwise.
pub const DEFAULT_SWIFT_VERSION: SwiftVersion = SwiftVersion::new(5, 10, 0);

/// Time spent by one rule, in seconds.
pub type RuleTime = (String, f64);

/// Result of running one rule over one file.
struct LintResult {
    violations: Vec<StyleViolation>,
    rule_time: Option<RuleTime>,
    deprecated_to_valid: Vec<(&'static str, &'static str)>,
}

/// A file about to be linted.
pub struct Linter<'a> {
    file: SourceFile,
    configuration: &'a Configuration,
    cache: Option<&'a LinterCache>,
    compiler_arguments: Vec<String>,
    swift_version: SwiftVersion,
    rules: Vec<SharedRule>,
}

impl<'a> Linter<'a> {
    /// Prepares `file` for linting.
    ///
    /// Without compiler arguments every enabled rule except analyzer rules
    /// runs. With compiler arguments only analyzer rules run.
    #[must_use]
    pub fn new(
        file: SourceFile,
        configuration: &'a Configuration,
        cache: Option<&'a LinterCache>,
        compiler_arguments: Vec<String>,
    ) -> Self {
        let analyze = !compiler_arguments.is_empty();
        let rules = configuration
            .rules()
            .iter()
            .filter(|rule| rule.description().has(Capabilities::ANALYZER_ONLY) == analyze)
            .cloned()
            .collect();
        Self {
            file,
            configuration,
            cache,
            compiler_arguments,
            swift_version: DEFAULT_SWIFT_VERSION,
            rules,
        }
    }

    /// Checks rules against another language version.
    #[must_use]
    pub fn with_swift_version(mut self, swift_version: SwiftVersion) -> Self {
        self.swift_version = swift_version;
        self
    }

    /// The file to lint.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Returns `true` if any rule to run has a collect phase.
    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.description().has(Capabilities::COLLECTING))
    }

    /// Runs the collect phase of every collecting rule in parallel.
    #[must_use]
    pub fn collect(self, storage: &'a RuleStorage) -> CollectedLinter<'a> {
        if let Some(path) = self.file.path() {
            self.rules
                .par_iter()
                .filter(|rule| rule.description().has(Capabilities::COLLECTING))
                .filter(|rule| should_run(rule.as_ref(), &self.file, self.swift_version, self.configuration))
                .for_each(|rule| {
                    let identifier = rule.description().identifier;
                    let ctx = RuleContext::new(storage, &self.compiler_arguments, identifier);
                    if let Some(info) = rule.collect(&self.file, &ctx) {
                        storage.collect(identifier, path, info);
                    }
                });
        }
        CollectedLinter {
            file: self.file,
            configuration: self.configuration,
            cache: self.cache,
            compiler_arguments: self.compiler_arguments,
            swift_version: self.swift_version,
            rules: self.rules,
            storage,
        }
    }
}

/// A file whose collect phase has run.
pub struct CollectedLinter<'a> {
    file: SourceFile,
    configuration: &'a Configuration,
    cache: Option<&'a LinterCache>,
    compiler_arguments: Vec<String>,
    swift_version: SwiftVersion,
    rules: Vec<SharedRule>,
    storage: &'a RuleStorage,
}

impl CollectedLinter<'_> {
    /// The file to lint.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Violations of the file, from the cache when possible.
    #[must_use]
    pub fn style_violations(&self) -> Vec<StyleViolation> {
        self.compute(false).0
    }

    /// Violations of the file and the time each rule took.
    ///
    /// On a cache hit the lookup time is split evenly across the rules.
    #[must_use]
    pub fn style_violations_and_rule_times(&self) -> (Vec<StyleViolation>, Vec<RuleTime>) {
        self.compute(true)
    }

    fn compute(&self, benchmark: bool) -> (Vec<StyleViolation>, Vec<RuleTime>) {
        if self.file.is_empty() {
            return (Vec::new(), Vec::new());
        }
        if let Some(cached) = self.cached_violations(benchmark) {
            return cached;
        }

        let regions = self.file.regions();
        let superfluous = self
            .rules
            .iter()
            .find_map(|rule| rule.as_any().downcast_ref::<SuperfluousDisableCommandRule>());

        let results: Vec<LintResult> = self
            .rules
            .par_iter()
            .filter_map(|rule| self.lint_rule(rule.as_ref(), regions, superfluous, benchmark))
            .collect();

        let mut violations: Vec<StyleViolation> = Vec::new();
        let mut rule_times = Vec::new();
        let mut deprecated_to_valid = BTreeMap::new();
        for result in results {
            violations.extend(result.violations);
            rule_times.extend(result.rule_time);
            deprecated_to_valid.extend(result.deprecated_to_valid);
        }
        violations.extend(self.undefined_identifier_violations(regions, superfluous));

        if let (Some(cache), Some(path)) = (self.cache, self.file.path()) {
            cache.cache(
                path,
                &LinterCache::content_fingerprint(self.file.contents()),
                &self.configuration.fingerprint(),
                &violations,
            );
        }

        let session = self.configuration.session();
        for (deprecated, identifier) in deprecated_to_valid {
            session.report_renamed_rule(deprecated, identifier);
        }

        (violations, rule_times)
    }

    fn cached_violations(&self, benchmark: bool) -> Option<(Vec<StyleViolation>, Vec<RuleTime>)> {
        let start = Instant::now();
        let cache = self.cache?;
        let path = self.file.path()?;
        let violations = cache.violations(
            path,
            &LinterCache::content_fingerprint(self.file.contents()),
            &self.configuration.fingerprint(),
        )?;
        debug!("Using cached violations for {}", path.display());

        let mut rule_times = Vec::new();
        if benchmark && !self.rules.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let share = start.elapsed().as_secs_f64() / self.rules.len() as f64;
            rule_times = self
                .rules
                .iter()
                .map(|rule| (rule.description().identifier.to_string(), share))
                .collect();
        }
        Some((violations, rule_times))
    }

    fn lint_rule(
        &self,
        rule: &dyn Rule,
        regions: &[Region],
        superfluous: Option<&SuperfluousDisableCommandRule>,
        benchmark: bool,
    ) -> Option<LintResult> {
        if !should_run(rule, &self.file, self.swift_version, self.configuration) {
            return None;
        }
        let description = rule.description();
        let ctx = RuleContext::new(self.storage, &self.compiler_arguments, description.identifier);

        let start = benchmark.then(Instant::now);
        let violations = rule.validate(&self.file, &ctx);
        let rule_time = start.map(|s| (description.identifier.to_string(), s.elapsed().as_secs_f64()));

        let custom_identifiers = rule.custom_identifiers();
        let mut disabled_regions = Vec::new();
        let mut enabled = Vec::new();
        for violation in &violations {
            let region = regions.iter().find(|r| r.contains(&violation.location));
            let disabled = region.is_some_and(|r| {
                r.is_rule_disabled(description)
                    || r.is_identifier_disabled([violation.rule_identifier.as_str()])
            });
            if disabled {
                disabled_regions.extend(region);
            } else {
                enabled.push(violation.clone());
            }
        }

        if self.file.contents().starts_with("#!") {
            enabled.retain(|v| v.location.line != Some(1));
        }

        let deprecated_to_valid = disabled_regions
            .iter()
            .flat_map(|region| region.deprecated_aliases_disabling(description))
            .map(|alias| (alias, description.identifier))
            .collect();

        if let Some(superfluous) = superfluous {
            let mut identifiers: BTreeSet<String> = description
                .all_identifiers()
                .chain(SUPERFLUOUS_DISABLE_COMMAND.all_identifiers())
                .chain(std::iter::once(ALL_RULES))
                .map(str::to_string)
                .collect();
            identifiers.extend(custom_identifiers.iter().cloned());
            let restricted;
            let regions = if regions.len() > 1 {
                restricted = self.file.regions_restricted_to(&identifiers);
                restricted.as_slice()
            } else {
                regions
            };

            enabled.extend(superfluous_violations(
                superfluous,
                regions,
                description.identifier,
                |r| r.is_rule_disabled(description),
                violations.iter(),
            ));
            for custom in &custom_identifiers {
                enabled.extend(superfluous_violations(
                    superfluous,
                    regions,
                    custom,
                    |r| r.is_identifier_disabled([custom.as_str()]),
                    violations.iter().filter(|v| &v.rule_identifier == custom),
                ));
            }
        }

        Some(LintResult {
            violations: enabled,
            rule_time,
            deprecated_to_valid,
        })
    }

    /// Disable commands naming identifiers no rule has.
    fn undefined_identifier_violations(
        &self,
        regions: &[Region],
        superfluous: Option<&SuperfluousDisableCommandRule>,
    ) -> Vec<StyleViolation> {
        let Some(superfluous) = superfluous else {
            return Vec::new();
        };
        let mut valid = self.configuration.catalog().all_valid_identifiers();
        valid.extend(self.configuration.custom_rule_identifiers());
        valid.insert(ALL_RULES.to_string());

        regions
            .iter()
            .flat_map(|region| {
                region
                    .disabled_rule_identifiers
                    .iter()
                    .filter(|id| !valid.contains(*id))
                    .map(|id| superfluous.non_existent_rule_violation(id, region.start.clone()))
            })
            .collect()
    }

    /// Applies the corrections of every correctable rule and writes the
    /// result back to disk.
    ///
    /// Files whose cached violations are empty are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::FileNotWritable`] if the corrected file cannot be
    /// written.
    pub fn correct(&self) -> Result<Vec<Correction>, Issue> {
        if self
            .cached_violations(false)
            .is_some_and(|(violations, _)| violations.is_empty())
        {
            return Ok(Vec::new());
        }

        let mut current: Option<SourceFile> = None;
        let mut corrections = Vec::new();
        for rule in self
            .rules
            .iter()
            .filter(|r| r.description().has(Capabilities::CORRECTABLE))
        {
            let file = current.as_ref().unwrap_or(&self.file);
            if !should_run(rule.as_ref(), file, self.swift_version, self.configuration) {
                continue;
            }
            let ctx = RuleContext::new(self.storage, &self.compiler_arguments, rule.description().identifier);
            if let Some((contents, applied)) = rule.correct(file, &ctx) {
                corrections.extend(applied);
                current = Some(SourceFile::new(self.file.path().map(Into::into), contents));
            }
        }

        if let (Some(corrected), Some(path)) = (current, self.file.path()) {
            if corrected.contents() != self.file.contents() {
                std::fs::write(path, corrected.contents()).map_err(|source| Issue::FileNotWritable {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(corrections)
    }
}

fn should_run(
    rule: &dyn Rule,
    file: &SourceFile,
    swift_version: SwiftVersion,
    configuration: &Configuration,
) -> bool {
    let description = rule.description();
    if file.is_empty() || swift_version < description.min_swift_version {
        return false;
    }
    if !description.has(Capabilities::SOURCEKIT_FREE) && file.parser_failed() {
        configuration.session().warn_parser_failed_once();
        return false;
    }
    true
}

/// Regions disabling a rule that suppress none of its violations.
///
/// Regions starting inside a region that itself disables the superfluous
/// check are skipped.
fn superfluous_violations<'v>(
    superfluous: &SuperfluousDisableCommandRule,
    regions: &[Region],
    identifier: &str,
    disables: impl Fn(&Region) -> bool,
    violations: impl Iterator<Item = &'v StyleViolation> + Clone,
) -> Vec<StyleViolation> {
    let silencing: Vec<&Region> = regions
        .iter()
        .filter(|r| r.is_rule_disabled(&SUPERFLUOUS_DISABLE_COMMAND))
        .collect();

    regions
        .iter()
        .filter(|region| disables(region))
        .filter(|region| !silencing.iter().any(|s| s.contains(&region.start)))
        .filter(|region| !violations.clone().any(|v| region.contains(&v.location)))
        .map(|region| superfluous.superfluous_violation(identifier, region.start.clone()))
        .collect()
}
