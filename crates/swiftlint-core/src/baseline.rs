//! Baselines of known violations.
//!
//! A baseline records the violations of a previous run so that later runs
//! only report new ones. Violations are matched by the text of their line
//! and their reason rather than by line number, so unrelated edits that
//! shift lines do not resurface known violations.

use crate::types::{Location, StyleViolation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or writing a baseline.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The baseline file could not be read.
    #[error("failed to read baseline at {}: {source}", .path.display())]
    Read {
        /// Path of the baseline.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The baseline file is not a valid baseline.
    #[error("failed to parse baseline at {}: {source}", .path.display())]
    Parse {
        /// Path of the baseline.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The baseline could not be written.
    #[error("failed to write baseline at {}: {source}", .path.display())]
    Write {
        /// Path of the baseline.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The baseline could not be serialized.
    #[error("failed to serialize baseline: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BaselineError {
    /// Returns `true` if the baseline file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A violation with a relative path and the text of its line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaselineViolation {
    /// The violation, its file relative to the base directory.
    pub violation: StyleViolation,
    /// Text of the violating line, empty if unavailable.
    pub text: String,
}

impl BaselineViolation {
    fn key(&self) -> (&str, &str) {
        (&self.text, &self.violation.reason)
    }

    fn relative_file(&self) -> String {
        self.violation
            .location
            .file
            .as_ref()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn sort_key(&self) -> (&Location, &str) {
        (&self.violation.location, &self.violation.rule_identifier)
    }
}

type PerFile = BTreeMap<String, Vec<BaselineViolation>>;

/// Violations to ignore, grouped by relative file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    base_directory: PathBuf,
    per_file: PerFile,
}

impl Baseline {
    /// Records `violations`. Paths are made relative to `base_directory` and
    /// line texts are read from disk.
    #[must_use]
    pub fn new(violations: &[StyleViolation], base_directory: &Path) -> Self {
        Self {
            base_directory: base_directory.to_path_buf(),
            per_file: group_by_file(to_baseline_violations(violations, base_directory)),
        }
    }

    /// Reads a baseline written by [`Baseline::write`].
    ///
    /// # Errors
    ///
    /// Returns [`BaselineError`] if the file cannot be read or parsed.
    pub fn read(path: &Path, base_directory: &Path) -> Result<Self, BaselineError> {
        let text = std::fs::read_to_string(path).map_err(|source| BaselineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let violations: Vec<BaselineViolation> =
            serde_json::from_str(&text).map_err(|source| BaselineError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            base_directory: base_directory.to_path_buf(),
            per_file: group_by_file(violations),
        })
    }

    /// Writes every recorded violation, sorted, as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BaselineError`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), BaselineError> {
        let json = serde_json::to_string_pretty(&self.sorted())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| BaselineError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| BaselineError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Recorded violations with absolute paths, sorted.
    #[must_use]
    pub fn violations(&self) -> Vec<StyleViolation> {
        self.sorted()
            .into_iter()
            .map(|v| self.absolute(&v.violation))
            .collect()
    }

    fn sorted(&self) -> Vec<&BaselineViolation> {
        let mut all: Vec<&BaselineViolation> = self.per_file.values().flatten().collect();
        all.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        all
    }

    /// The violations that are not part of the baseline.
    ///
    /// Within a file and rule, violations sharing line text and reason form a
    /// group. A group survives as a whole when it has more members than the
    /// baseline's group for the same key, and is dropped as a whole
    /// otherwise. Violations of files or rules the baseline does not know
    /// always survive.
    #[must_use]
    pub fn filter(&self, violations: &[StyleViolation]) -> Vec<StyleViolation> {
        let relative = to_baseline_violations(violations, &self.base_directory);
        let mut surviving: HashSet<BaselineViolation> = HashSet::new();
        for (file, new_violations) in group_by_file(relative) {
            match self.per_file.get(&file).filter(|known| !known.is_empty()) {
                Some(known) => surviving.extend(new_in(&new_violations, known)),
                None => surviving.extend(new_violations),
            }
        }

        violations
            .iter()
            .zip(to_baseline_violations(violations, &self.base_directory))
            .filter(|(_, relative)| surviving.contains(relative))
            .map(|(violation, _)| violation.clone())
            .collect()
    }

    /// Violations present in `other` but not in this baseline, sorted.
    ///
    /// Uses the same matching as [`Baseline::filter`].
    #[must_use]
    pub fn compare(&self, other: &Self) -> Vec<StyleViolation> {
        let mut new: Vec<BaselineViolation> = other
            .per_file
            .iter()
            .flat_map(|(file, violations)| match self.per_file.get(file) {
                Some(known) => new_in(violations, known).into_iter().collect::<Vec<_>>(),
                None => violations.clone(),
            })
            .collect();
        new.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        new.iter().map(|v| other.absolute(&v.violation)).collect()
    }

    fn absolute(&self, violation: &StyleViolation) -> StyleViolation {
        let location = &violation.location;
        violation.with_location(Location::from_parts(
            location.file.as_ref().map(|f| self.base_directory.join(f)),
            location.line,
            location.character,
        ))
    }
}

/// Members of `violations` the `baseline` of the same file does not cover.
fn new_in(
    violations: &[BaselineViolation],
    baseline: &[BaselineViolation],
) -> HashSet<BaselineViolation> {
    let mut sorted_new: Vec<&BaselineViolation> = violations.iter().collect();
    let mut sorted_known: Vec<&BaselineViolation> = baseline.iter().collect();
    sorted_new.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    sorted_known.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    if sorted_new == sorted_known {
        return HashSet::new();
    }

    let new_by_rule = group_by_rule(violations, baseline);
    let known_by_rule = group_by_rule(baseline, violations);

    let mut surviving = HashSet::new();
    for (rule, rule_violations) in new_by_rule {
        let Some(known) = known_by_rule.get(rule).filter(|k| !k.is_empty()) else {
            surviving.extend(rule_violations.into_iter().cloned());
            continue;
        };

        let mut known_counts: HashMap<(&str, &str), usize> = HashMap::new();
        for violation in known {
            *known_counts.entry(violation.key()).or_default() += 1;
        }
        let mut new_groups: HashMap<(&str, &str), Vec<&BaselineViolation>> = HashMap::new();
        for violation in rule_violations {
            new_groups.entry(violation.key()).or_default().push(violation);
        }

        for (key, group) in new_groups {
            let known_count = known_counts.get(&key).copied().unwrap_or(0);
            if group.len() > known_count {
                surviving.extend(group.into_iter().cloned());
            }
        }
    }
    surviving
}

/// Unique members of `violations` not exactly present in `existing`, by rule.
fn group_by_rule<'a>(
    violations: &'a [BaselineViolation],
    existing: &[BaselineViolation],
) -> HashMap<&'a str, Vec<&'a BaselineViolation>> {
    let existing: HashSet<&BaselineViolation> = existing.iter().collect();
    let mut seen = HashSet::new();
    let mut grouped: HashMap<&str, Vec<&BaselineViolation>> = HashMap::new();
    for violation in violations {
        if existing.contains(violation) || !seen.insert(violation) {
            continue;
        }
        grouped
            .entry(violation.violation.rule_identifier.as_str())
            .or_default()
            .push(violation);
    }
    grouped
}

fn group_by_file(violations: Vec<BaselineViolation>) -> PerFile {
    let mut grouped = PerFile::new();
    for violation in violations {
        grouped.entry(violation.relative_file()).or_default().push(violation);
    }
    grouped
}

fn to_baseline_violations(violations: &[StyleViolation], base_directory: &Path) -> Vec<BaselineViolation> {
    let mut lines = LineCache::default();
    violations
        .iter()
        .map(|violation| BaselineViolation {
            text: lines.text_at(&violation.location),
            violation: violation.with_location(violation.location.relative_to(base_directory)),
        })
        .collect()
}

/// Lines of files read so far.
#[derive(Default)]
struct LineCache {
    files: HashMap<PathBuf, Option<Vec<String>>>,
}

impl LineCache {
    fn text_at(&mut self, location: &Location) -> String {
        let (Some(file), Some(line)) = (&location.file, location.line) else {
            return String::new();
        };
        let Some(index) = line.checked_sub(1) else {
            return String::new();
        };
        self.files
            .entry(file.clone())
            .or_insert_with(|| {
                std::fs::read_to_string(file)
                    .ok()
                    .map(|text| text.lines().map(str::to_string).collect())
            })
            .as_ref()
            .and_then(|lines| lines.get(index).cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn violation(file: &Path, rule: &str, line: usize, reason: &str) -> StyleViolation {
        StyleViolation::new(rule, rule, Severity::Warning, Location::new(file, line, 1), reason)
    }

    fn force_try(file: &Path, line: usize) -> StyleViolation {
        violation(file, "force_try", line, "Force tries should be avoided")
    }

    #[test]
    fn test_unchanged_violations_are_filtered() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        fs::write(&file, "let x = try! foo()\n").unwrap();

        let violations = vec![force_try(&file, 1)];
        let baseline = Baseline::new(&violations, dir.path());
        assert!(baseline.filter(&violations).is_empty());
        assert_eq!(baseline.violations(), violations);
    }

    #[test]
    fn test_changed_line_text_survives() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        fs::write(&file, "let x = try! foo()\n").unwrap();
        let baseline = Baseline::new(&[force_try(&file, 1)], dir.path());

        fs::write(&file, "let y = try! foo()\n").unwrap();
        let violations = vec![force_try(&file, 1)];
        assert_eq!(baseline.filter(&violations), violations);
    }

    #[test]
    fn test_shifted_lines_still_match() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        fs::write(&file, "let x = try! foo()\n").unwrap();
        let baseline = Baseline::new(&[force_try(&file, 1)], dir.path());

        fs::write(&file, "\n\nlet x = try! foo()\n").unwrap();
        assert!(baseline.filter(&[force_try(&file, 3)]).is_empty());
    }

    #[test]
    fn test_group_with_more_occurrences_survives_whole() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        fs::write(&file, "let x = try! foo()\n").unwrap();
        let baseline = Baseline::new(&[force_try(&file, 1)], dir.path());

        fs::write(&file, "let x = try! foo()\nlet x = try! foo()\n").unwrap();
        let violations = vec![force_try(&file, 1), force_try(&file, 2)];
        assert_eq!(baseline.filter(&violations).len(), 1);

        fs::write(&file, "\nlet x = try! foo()\nlet x = try! foo()\n").unwrap();
        let shifted = vec![force_try(&file, 2), force_try(&file, 3)];
        assert_eq!(baseline.filter(&shifted), shifted);
    }

    #[test]
    fn test_unknown_files_and_rules_survive() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        let other = dir.path().join("Other.swift");
        fs::write(&file, "let x = try! foo()\n").unwrap();
        fs::write(&other, "let x = try! foo()\n").unwrap();
        let baseline = Baseline::new(&[force_try(&file, 1)], dir.path());

        let violations = vec![
            force_try(&other, 1),
            violation(&file, "todo", 1, "TODOs should be resolved"),
        ];
        assert_eq!(baseline.filter(&violations), violations);
    }

    #[test]
    fn test_write_read_and_compare() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("File.swift");
        fs::write(&file, "let x = try! foo()\nlet y = try! bar()\n").unwrap();
        let old = Baseline::new(&[force_try(&file, 1)], dir.path());
        let path = dir.path().join("baseline.json");
        old.write(&path).unwrap();

        let read = Baseline::read(&path, dir.path()).unwrap();
        assert_eq!(read, old);

        let new = Baseline::new(&[force_try(&file, 1), force_try(&file, 2)], dir.path());
        assert_eq!(old.compare(&new), vec![force_try(&file, 2)]);
        assert!(new.compare(&old).is_empty());
    }

    #[test]
    fn test_missing_baseline() {
        let dir = TempDir::new().unwrap();
        let error = Baseline::read(&dir.path().join("missing.json"), dir.path()).unwrap_err();
        assert!(error.is_not_found());
    }
}
