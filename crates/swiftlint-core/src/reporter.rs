//! Report rendering.

use crate::types::{Severity, StyleViolation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Renders violations for output.
pub trait Reporter: Send + Sync {
    /// Name used by `--reporter` and the `reporter` key.
    fn identifier(&self) -> &'static str;

    /// Renders `violations` into a complete report.
    fn generate_report(&self, violations: &[StyleViolation]) -> String;
}

/// Identifier of the reporter used when none is configured.
pub const DEFAULT_REPORTER: &str = "xcode";

/// Every available reporter, default first.
#[must_use]
pub fn reporters() -> Vec<Box<dyn Reporter>> {
    vec![
        Box::new(XcodeReporter),
        Box::new(JsonReporter),
        Box::new(SummaryReporter),
    ]
}

/// Reporter with the given identifier.
#[must_use]
pub fn reporter_for(identifier: &str) -> Option<Box<dyn Reporter>> {
    reporters().into_iter().find(|r| r.identifier() == identifier)
}

/// `file:line:character: severity: Name Violation: reason (rule_id)`, the
/// format IDEs pick up.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcodeReporter;

impl Reporter for XcodeReporter {
    fn identifier(&self) -> &'static str {
        "xcode"
    }

    fn generate_report(&self, violations: &[StyleViolation]) -> String {
        violations
            .iter()
            .map(|v| {
                format!(
                    "{}: {}: {} Violation: {} ({})",
                    v.location, v.severity, v.rule_name, v.reason, v.rule_identifier
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A JSON array of violation objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

#[derive(Serialize)]
struct JsonViolation<'a> {
    character: Option<usize>,
    file: Option<String>,
    line: Option<usize>,
    reason: &'a str,
    rule_id: &'a str,
    severity: &'static str,
    #[serde(rename = "type")]
    kind: &'a str,
}

impl Reporter for JsonReporter {
    fn identifier(&self) -> &'static str {
        "json"
    }

    fn generate_report(&self, violations: &[StyleViolation]) -> String {
        let entries: Vec<JsonViolation<'_>> = violations
            .iter()
            .map(|v| JsonViolation {
                character: v.location.character,
                file: v.location.file.as_ref().map(|f| f.display().to_string()),
                line: v.location.line,
                reason: &v.reason,
                rule_id: &v.rule_identifier,
                severity: match v.severity {
                    Severity::Warning => "Warning",
                    Severity::Error => "Error",
                },
                kind: &v.rule_name,
            })
            .collect();
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    }
}

/// A table of violation counts per rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryReporter;

impl Reporter for SummaryReporter {
    fn identifier(&self) -> &'static str {
        "summary"
    }

    fn generate_report(&self, violations: &[StyleViolation]) -> String {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for violation in violations {
            let entry = counts.entry(&violation.rule_identifier).or_default();
            match violation.severity {
                Severity::Warning => entry.0 += 1,
                Severity::Error => entry.1 += 1,
            }
        }

        let width = counts.keys().map(|k| k.len()).max().unwrap_or(0).max("rule identifier".len());
        let mut report = String::new();
        let _ = writeln!(report, "{:<width$} | warnings | errors | total", "rule identifier");
        let _ = writeln!(report, "{}-+----------+--------+------", "-".repeat(width));
        let (mut warnings, mut errors) = (0, 0);
        for (rule, (w, e)) in &counts {
            warnings += w;
            errors += e;
            let _ = writeln!(report, "{rule:<width$} | {w:>8} | {e:>6} | {:>5}", w + e);
        }
        let _ = writeln!(report, "{}-+----------+--------+------", "-".repeat(width));
        let _ = write!(
            report,
            "{:<width$} | {warnings:>8} | {errors:>6} | {:>5}",
            "total",
            warnings + errors
        );
        report
    }
}
