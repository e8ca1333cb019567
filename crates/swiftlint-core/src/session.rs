//! Process-wide state of one invocation.
//!
//! Some warnings must be printed at most once no matter how many files or
//! configurations trigger them. A [`LintSession`] is created once at start-up
//! and shared by handle with the resolver and the pipeline.

use crate::issue::Issue;
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::warn;

/// Shared de-duplication state for warnings.
#[derive(Debug, Default)]
pub struct LintSession {
    reported: Mutex<HashSet<String>>,
}

impl LintSession {
    /// Creates a session that has not reported anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` and returns `true` if it was not recorded before.
    pub fn first_time(&self, key: impl Into<String>) -> bool {
        self.reported.lock().insert(key.into())
    }

    /// Prints `issue` unless an identical issue was printed already.
    pub fn report_once(&self, issue: &Issue) {
        if self.first_time(issue.to_string()) {
            issue.print();
        }
    }

    /// Warns that parser-dependent rules are skipped.
    pub fn warn_parser_failed_once(&self) {
        if self.first_time("parser-failed") {
            warn!("Parser-based rules will be skipped because the parser has failed.");
        }
    }

    /// Warns that a rule was disabled through a deprecated identifier.
    pub fn report_renamed_rule(&self, old: &str, new: &str) {
        if self.first_time(format!("renamed:{old}:{new}")) {
            warn!(
                "'{old}' rule has been renamed to '{new}' and will be completely removed in a future release."
            );
        }
    }

    /// Number of distinct warnings printed so far.
    #[must_use]
    pub fn reported_count(&self) -> usize {
        self.reported.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_once() {
        let session = LintSession::new();
        let issue = Issue::InvalidRuleIdentifier {
            rule_id: "nope".to_string(),
        };
        session.report_once(&issue);
        session.report_once(&issue);
        session.report_renamed_rule("old", "new");
        session.report_renamed_rule("old", "new");
        session.warn_parser_failed_once();
        session.warn_parser_failed_once();
        assert_eq!(session.reported_count(), 3);
    }
}
