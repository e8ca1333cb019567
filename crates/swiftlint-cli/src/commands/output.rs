//! Shared output formatting for lint results.
//!
//! Reports go to standard output. Status lines go to standard error so that
//! a report can be piped without them.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use swiftlint_core::{reporter_for, reporters, Reporter, RuleTime, Severity, StyleViolation};

/// Number of entries printed per benchmark table.
const BENCHMARK_ENTRIES: usize = 10;

/// Looks up a reporter by identifier.
pub fn reporter(identifier: &str) -> Result<Box<dyn Reporter>> {
    reporter_for(identifier).ok_or_else(|| {
        let available: Vec<&str> = reporters().iter().map(|r| r.identifier()).collect();
        anyhow!(
            "No reporter with identifier '{identifier}' available; choose one of: {}",
            available.join(", ")
        )
    })
}

/// Prints the report of `violations`, if there is anything to report.
pub fn print_report(reporter: &dyn Reporter, violations: &[StyleViolation]) {
    let report = reporter.generate_report(violations);
    if !report.is_empty() {
        println!("{report}");
    }
}

/// Counts of a run's violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Violations of any severity.
    pub violations: usize,
    /// Error-severity violations.
    pub serious: usize,
    /// Files linted.
    pub files: usize,
}

impl Summary {
    /// Counts `violations` found in `files` files.
    #[must_use]
    pub fn of(violations: &[StyleViolation], files: usize) -> Self {
        Self {
            violations: violations.len(),
            serious: violations.iter().filter(|v| v.severity == Severity::Error).count(),
            files,
        }
    }

    /// Number of warning-severity violations.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.violations - self.serious
    }

    /// The closing status line.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Done linting! Found {} violation{}, {} serious in {} file{}.",
            self.violations,
            plural(self.violations),
            self.serious,
            self.files,
            plural(self.files)
        )
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Prints the slowest files and rules on standard error.
pub fn print_benchmark(file_times: &[(PathBuf, Duration)], rule_times: &[RuleTime]) {
    let mut files: Vec<&(PathBuf, Duration)> = file_times.iter().collect();
    files.sort_by(|a, b| b.1.cmp(&a.1));
    eprintln!("Slowest files:");
    for (path, duration) in files.into_iter().take(BENCHMARK_ENTRIES) {
        eprintln!("{:>10.3}s  {}", duration.as_secs_f64(), path.display());
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (identifier, seconds) in rule_times {
        *totals.entry(identifier.as_str()).or_default() += seconds;
    }
    let mut rules: Vec<(&str, f64)> = totals.into_iter().collect();
    rules.sort_by(|a, b| b.1.total_cmp(&a.1));
    eprintln!("Slowest rules:");
    for (identifier, seconds) in rules.into_iter().take(BENCHMARK_ENTRIES) {
        eprintln!("{seconds:>10.3}s  {identifier}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swiftlint_core::Location;

    fn violation(severity: Severity) -> StyleViolation {
        StyleViolation::new("force_try", "Force Try", severity, Location::new("a.swift", 1, 1), "reason")
    }

    #[test]
    fn test_summary_counts_serious_violations() {
        let summary = Summary::of(
            &[violation(Severity::Warning), violation(Severity::Error), violation(Severity::Warning)],
            1,
        );
        assert_eq!(summary.warnings(), 2);
        assert_eq!(summary.message(), "Done linting! Found 3 violations, 1 serious in 1 file.");
    }

    #[test]
    fn test_unknown_reporter_lists_the_available_ones() {
        let error = reporter("csv").err().map(|e| e.to_string()).unwrap_or_default();
        assert_eq!(
            error,
            "No reporter with identifier 'csv' available; choose one of: xcode, json, summary"
        );
        assert!(reporter("json").is_ok());
    }
}
