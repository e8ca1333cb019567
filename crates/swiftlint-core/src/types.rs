//! Core types for violations and source locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity level for style violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a severity from its configuration spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A position in a source file.
///
/// Locations are totally ordered by file, then line, then character. A
/// missing component sorts before any present one, so `line: None` denotes
/// "before the first line".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path of the file, if the location belongs to one.
    pub file: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: Option<usize>,
    /// Character offset within the line (1-indexed).
    pub character: Option<usize>,
}

impl Location {
    /// Creates a location with every component present.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, character: usize) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            character: Some(character),
        }
    }

    /// Creates a location pointing at a whole line.
    #[must_use]
    pub fn line(file: Option<PathBuf>, line: usize) -> Self {
        Self {
            file,
            line: Some(line),
            character: None,
        }
    }

    /// Creates a location from optional components.
    #[must_use]
    pub fn from_parts(file: Option<PathBuf>, line: Option<usize>, character: Option<usize>) -> Self {
        Self {
            file,
            line,
            character,
        }
    }

    /// Returns the `(line, character)` pair used for intra-file comparisons.
    #[must_use]
    pub fn position(&self) -> (Option<usize>, Option<usize>) {
        (self.line, self.character)
    }

    /// Returns a copy with the file path made relative to `base`.
    ///
    /// Paths outside `base` are kept unchanged.
    #[must_use]
    pub fn relative_to(&self, base: &Path) -> Self {
        let file = self
            .file
            .as_ref()
            .map(|f| f.strip_prefix(base).map_or_else(|_| f.clone(), Path::to_path_buf));
        Self {
            file,
            line: self.line,
            character: self.character,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
        } else {
            write!(f, "<nopath>")?;
        }
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(character) = self.character {
                write!(f, ":{character}")?;
            }
        }
        Ok(())
    }
}

/// A style violation produced by a rule.
///
/// Violations are values: rewrites such as severity changes or path
/// rebasing produce new violations instead of mutating the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleViolation {
    /// Identifier of the rule that produced the violation.
    pub rule_identifier: String,
    /// Human readable name of the rule.
    #[serde(default)]
    pub rule_name: String,
    /// Severity of the violation.
    pub severity: Severity,
    /// Where the violation occurred.
    pub location: Location,
    /// Why the code is in violation.
    pub reason: String,
}

impl StyleViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        rule_identifier: impl Into<String>,
        rule_name: impl Into<String>,
        severity: Severity,
        location: Location,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            rule_identifier: rule_identifier.into(),
            rule_name: rule_name.into(),
            severity,
            location,
            reason: reason.into(),
        }
    }

    /// Returns a copy with a different severity.
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Self {
        Self {
            severity,
            ..self.clone()
        }
    }

    /// Returns a copy with a different location.
    #[must_use]
    pub fn with_location(&self, location: Location) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }
}

/// A correction applied to a file by a correctable rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Identifier of the rule that applied the correction.
    pub rule_identifier: String,
    /// Where the correction was applied.
    pub location: Location,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Corrected {}", self.location, self.rule_identifier)
    }
}

/// Sorts violations by location, then by rule identifier.
pub fn sort_violations(violations: &mut [StyleViolation]) {
    violations.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then_with(|| a.rule_identifier.cmp(&b.rule_identifier))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_components_sort_first() {
        let file = Some(PathBuf::from("a.swift"));
        let before = Location::from_parts(file.clone(), None, None);
        let line_only = Location::line(file.clone(), 3);
        let full = Location::new("a.swift", 3, 1);

        assert!(before < line_only);
        assert!(line_only < full);
        assert!(Location::default() < before);
    }

    #[test]
    fn test_location_orders_by_file_first() {
        let a = Location::new("a.swift", 10, 1);
        let b = Location::new("b.swift", 1, 1);
        assert!(a < b);
    }

    #[test]
    fn test_relative_to() {
        let loc = Location::new("/project/src/a.swift", 2, 4);
        let rel = loc.relative_to(Path::new("/project"));
        assert_eq!(rel.file, Some(PathBuf::from("src/a.swift")));
        assert_eq!(rel.line, Some(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::new("a.swift", 1, 2).to_string(), "a.swift:1:2");
        assert_eq!(Location::line(None, 7).to_string(), "<nopath>:7");
    }

    #[test]
    fn test_rewrite_keeps_original() {
        let v = StyleViolation::new(
            "force_try",
            "Force Try",
            Severity::Warning,
            Location::new("a.swift", 1, 9),
            "Force tries should be avoided",
        );
        let escalated = v.with_severity(Severity::Error);
        assert_eq!(v.severity, Severity::Warning);
        assert_eq!(escalated.severity, Severity::Error);
        assert_eq!(escalated.reason, v.reason);
    }
}
