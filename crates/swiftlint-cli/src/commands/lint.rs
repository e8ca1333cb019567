//! `lint` and `analyze` implementation.

use super::analyze::CompilerArguments;
use super::output::{self, Summary};
use crate::config_resolver;
use crate::LintArgs;
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use swiftlint_core::{
    sort_violations, Baseline, CollectedLinter, Configuration, Issue, LintSession, Linter,
    LinterCache, RuleStorage, RuleTime, Severity, SourceFile, StyleViolation, DEFAULT_REPORTER,
};
use tracing::{debug, info, warn};

/// Exit status of a run failed by its violations.
const VIOLATIONS_FAILURE: u8 = 2;

/// Violations of one file.
struct FileResult {
    path: PathBuf,
    violations: Vec<StyleViolation>,
    rule_times: Vec<RuleTime>,
    duration: Duration,
}

/// Runs `lint`, or `analyze` when `compiler_arguments` are given.
pub fn run(args: &LintArgs, compiler_arguments: Option<&CompilerArguments>) -> Result<ExitCode> {
    if let Some(directory) = &args.working_directory {
        std::env::set_current_dir(directory)
            .with_context(|| format!("Could not change to directory {}", directory.display()))?;
    }
    let root = std::env::current_dir().context("Could not determine the current directory")?;

    let session = Arc::new(LintSession::new());
    let resolver = config_resolver::resolver(session);
    let configuration = match resolver.resolve(&config_resolver::resolve_options(&root, args)) {
        Ok(configuration) => configuration,
        Err(issue) => {
            eprintln!("{:?}", miette::Report::new(issue));
            return Ok(ExitCode::FAILURE);
        }
    };

    let (strict, lenient) = (
        args.strict || configuration.strict(),
        args.lenient || configuration.lenient(),
    );
    if strict && lenient {
        bail!("Invalid command line or config options: 'strict' and 'lenient' are mutually exclusive.");
    }
    let reporter = output::reporter(
        args.reporter
            .as_deref()
            .or(configuration.reporter())
            .unwrap_or(DEFAULT_REPORTER),
    )?;

    let files = configuration.lintable_files(&args.paths, args.force_exclude, args.use_alternative_excluding);
    if files.is_empty() {
        if configuration.allow_zero_lintable_files() {
            if !args.quiet {
                eprintln!("No lintable files found");
            }
            return Ok(ExitCode::SUCCESS);
        }
        let paths: Vec<String> = args.paths.iter().map(|p| p.display().to_string()).collect();
        bail!("No lintable files found at paths: '{}'", paths.join(", "));
    }
    if !args.quiet {
        let verb = if compiler_arguments.is_some() { "Analyzing" } else { "Linting" };
        eprintln!("{verb} Swift files in {}", root.display());
    }

    let analyze = compiler_arguments.is_some();
    let cache = (!args.no_cache && !analyze).then(|| load_cache(args, &configuration));
    let configurations: Vec<Configuration> = files
        .iter()
        .map(|file| configuration.configuration_for_file(file))
        .collect();

    let storage = RuleStorage::new();
    let linters: Vec<CollectedLinter<'_>> = files
        .par_iter()
        .zip(configurations.par_iter())
        .filter_map(|(path, file_configuration)| {
            let arguments = match compiler_arguments {
                Some(all) => match all.get(path).filter(|a| !a.is_empty()) {
                    Some(arguments) => arguments.clone(),
                    None => {
                        warn!("Could not find compiler arguments for '{}'", path.display());
                        return None;
                    }
                },
                None => Vec::new(),
            };
            let file = match SourceFile::read(path) {
                Ok(file) => file,
                Err(source) => {
                    Issue::FileNotReadable {
                        path: path.clone(),
                        source,
                    }
                    .print();
                    return None;
                }
            };
            Some(Linter::new(file, file_configuration, cache.as_ref(), arguments).collect(&storage))
        })
        .collect();
    debug!("Collected {} files", linters.len());

    if args.fix {
        return Ok(correct(&linters, args.quiet));
    }

    let results: Vec<FileResult> = linters
        .par_iter()
        .map(|linter| lint_file(linter, args.benchmark))
        .collect();

    if let Some(cache) = &cache {
        if let Err(error) = cache.save() {
            warn!("{error}");
        }
    }

    let mut unfiltered: Vec<StyleViolation> = results.iter().flat_map(|r| r.violations.iter().cloned()).collect();
    sort_violations(&mut unfiltered);
    let unfiltered = apply_leniency(&unfiltered, strict, lenient);

    let write_baseline = args
        .write_baseline
        .as_deref()
        .or(configuration.write_baseline())
        .map(|p| root.join(p));
    let violations = match load_baseline(args, &configuration, write_baseline.as_deref()) {
        Some(baseline) => baseline.filter(&unfiltered),
        None => unfiltered.clone(),
    };
    if let Some(path) = &write_baseline {
        Baseline::new(&unfiltered, configuration.root_directory())
            .write(path)
            .with_context(|| format!("Could not write baseline to {}", path.display()))?;
        info!("Wrote baseline to {}", path.display());
    }

    output::print_report(reporter.as_ref(), &violations);
    if args.benchmark {
        let file_times: Vec<(PathBuf, Duration)> = results.iter().map(|r| (r.path.clone(), r.duration)).collect();
        let rule_times: Vec<RuleTime> = results.iter().flat_map(|r| r.rule_times.iter().cloned()).collect();
        output::print_benchmark(&file_times, &rule_times);
    }

    let summary = Summary::of(&violations, results.len());
    if !args.quiet {
        eprintln!("{}", summary.message());
    }
    Ok(ExitCode::from(exit_status(&summary, configuration.warning_threshold())))
}

fn lint_file(linter: &CollectedLinter<'_>, benchmark: bool) -> FileResult {
    let start = Instant::now();
    let (violations, rule_times) = if benchmark {
        linter.style_violations_and_rule_times()
    } else {
        (linter.style_violations(), Vec::new())
    };
    FileResult {
        path: linter.file().path().map(Path::to_path_buf).unwrap_or_default(),
        violations,
        rule_times,
        duration: start.elapsed(),
    }
}

fn correct(linters: &[CollectedLinter<'_>], quiet: bool) -> ExitCode {
    let corrected: Vec<usize> = linters
        .par_iter()
        .map(|linter| match linter.correct() {
            Ok(corrections) => {
                for correction in &corrections {
                    println!("{correction}");
                }
                corrections.len()
            }
            Err(issue) => {
                issue.print();
                0
            }
        })
        .collect();
    if !quiet {
        let files = corrected.iter().filter(|count| **count > 0).count();
        eprintln!("Done correcting {files} file{}!", if files == 1 { "" } else { "s" });
    }
    ExitCode::SUCCESS
}

fn load_cache(args: &LintArgs, configuration: &Configuration) -> LinterCache {
    let location = config_resolver::cache_location(args.cache_path.as_deref(), configuration);
    debug!("Violation cache location: {location:?}");
    location.path().map_or_else(LinterCache::in_memory, |path| {
        LinterCache::load(path, configuration.root_directory())
    })
}

/// The baseline to filter against, if one is configured and readable.
///
/// A baseline that does not exist yet is expected when the same path is
/// also written.
fn load_baseline(args: &LintArgs, configuration: &Configuration, write_path: Option<&Path>) -> Option<Baseline> {
    let root = configuration.root_directory();
    let path = root.join(args.baseline.as_deref().or(configuration.baseline())?);
    match Baseline::read(&path, root) {
        Ok(baseline) => Some(baseline),
        Err(error) if error.is_not_found() && write_path == Some(path.as_path()) => None,
        Err(error) => {
            debug!("{error}");
            Issue::BaselineNotReadable { path }.print();
            None
        }
    }
}

/// Rewrites severities for `--strict` and `--lenient`.
fn apply_leniency(violations: &[StyleViolation], strict: bool, lenient: bool) -> Vec<StyleViolation> {
    let target = match (strict, lenient) {
        (true, false) => Severity::Error,
        (false, true) => Severity::Warning,
        _ => return violations.to_vec(),
    };
    violations.iter().map(|v| v.with_severity(target)).collect()
}

fn exit_status(summary: &Summary, warning_threshold: Option<usize>) -> u8 {
    let threshold_reached = warning_threshold.is_some_and(|threshold| summary.warnings() >= threshold);
    if threshold_reached {
        eprintln!("Warning threshold exceeded");
    }
    if summary.serious > 0 || threshold_reached {
        VIOLATIONS_FAILURE
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swiftlint_core::Location;

    fn violation(severity: Severity) -> StyleViolation {
        StyleViolation::new("todo", "Todo", severity, Location::new("a.swift", 1, 1), "TODOs should be resolved")
    }

    #[test]
    fn test_strict_upgrades_warnings() {
        let rewritten = apply_leniency(&[violation(Severity::Warning)], true, false);
        assert_eq!(rewritten[0].severity, Severity::Error);
        let untouched = apply_leniency(&[violation(Severity::Warning)], false, false);
        assert_eq!(untouched[0].severity, Severity::Warning);
    }

    #[test]
    fn test_lenient_downgrades_errors() {
        let rewritten = apply_leniency(&[violation(Severity::Error)], false, true);
        assert_eq!(rewritten[0].severity, Severity::Warning);
    }

    #[test]
    fn test_errors_and_warning_threshold_fail_the_run() {
        let warnings = Summary::of(&[violation(Severity::Warning), violation(Severity::Warning)], 1);
        assert_eq!(exit_status(&warnings, None), 0);
        assert_eq!(exit_status(&warnings, Some(3)), 0);
        assert_eq!(exit_status(&warnings, Some(2)), VIOLATIONS_FAILURE);

        let errors = Summary::of(&[violation(Severity::Error)], 1);
        assert_eq!(exit_status(&errors, None), VIOLATIONS_FAILURE);
    }
}
