//! Shared storage for the collect phase.

use crate::rule::CollectedInfo;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Information collected by rules, keyed by rule identifier then by file.
///
/// Written concurrently during the collect phase. The pipeline only ever
/// writes a value into the slot of the rule that produced it, so rules
/// cannot clobber each other.
#[derive(Default)]
pub struct RuleStorage {
    slots: RwLock<HashMap<String, HashMap<PathBuf, CollectedInfo>>>,
}

impl RuleStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records what `rule_identifier` collected for `file`.
    pub fn collect(&self, rule_identifier: &str, file: &Path, info: CollectedInfo) {
        self.slots
            .write()
            .entry(rule_identifier.to_string())
            .or_default()
            .insert(file.to_path_buf(), info);
    }

    /// Everything collected by a rule.
    #[must_use]
    pub fn collected(&self, rule_identifier: &str) -> HashMap<PathBuf, CollectedInfo> {
        self.slots
            .read()
            .get(rule_identifier)
            .cloned()
            .unwrap_or_default()
    }

    /// Everything collected by a rule that has type `T`, sorted by file.
    #[must_use]
    pub fn collected_as<T: Any + Send + Sync>(&self, rule_identifier: &str) -> Vec<(PathBuf, Arc<T>)> {
        let mut entries: Vec<(PathBuf, Arc<T>)> = self
            .collected(rule_identifier)
            .into_iter()
            .filter_map(|(path, info)| info.downcast::<T>().ok().map(|value| (path, value)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of rules that stored something.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns `true` if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}
