//! How a configuration decides which rules run.

use crate::catalog::RuleCatalog;
use crate::command::ALL_RULES;
use crate::issue::Issue;
use crate::rule::Capabilities;
use std::collections::{BTreeMap, BTreeSet};

/// Rule enablement strategy of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RulesMode {
    /// Default rules run unless disabled, opt-in rules run only when listed.
    Default {
        /// Rules turned off.
        disabled: BTreeSet<String>,
        /// Opt-in and analyzer rules turned on.
        opt_in: BTreeSet<String>,
    },
    /// Exactly the listed rules run (`only_rules`).
    Only(BTreeSet<String>),
    /// Exactly the rules given with `--only-rule` run.
    OnlyCommandLine(BTreeSet<String>),
    /// Every rule runs (`--enable-all-rules`).
    AllCommandLine,
}

impl Default for RulesMode {
    fn default() -> Self {
        Self::Default {
            disabled: BTreeSet::new(),
            opt_in: BTreeSet::new(),
        }
    }
}

/// Rule lists read from one document, plus command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct RuleLists {
    /// `--enable-all-rules`.
    pub enable_all_rules: bool,
    /// `--only-rule`, repeated.
    pub only_rule: Vec<String>,
    /// `only_rules`.
    pub only_rules: Vec<String>,
    /// `opt_in_rules` (and its deprecated spelling `enabled_rules`).
    pub opt_in_rules: Vec<String>,
    /// `disabled_rules`.
    pub disabled_rules: Vec<String>,
    /// `analyzer_rules`.
    pub analyzer_rules: Vec<String>,
}

impl RulesMode {
    /// Derives the mode of a document.
    ///
    /// Command-line overrides take precedence over the document. `all` in
    /// `opt_in_rules` or `analyzer_rules` stands for every rule of that kind.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::OnlyRulesCombined`] if `only_rules` is combined with
    /// `disabled_rules` or `opt_in_rules`.
    pub fn new(lists: &RuleLists, catalog: &RuleCatalog) -> Result<Self, Issue> {
        if lists.enable_all_rules {
            return Ok(Self::AllCommandLine);
        }
        if !lists.only_rule.is_empty() {
            return Ok(Self::OnlyCommandLine(lists.only_rule.iter().cloned().collect()));
        }
        if !lists.only_rules.is_empty() {
            if !lists.disabled_rules.is_empty() || !lists.opt_in_rules.is_empty() {
                return Err(Issue::OnlyRulesCombined);
            }
            let only: Vec<String> = lists
                .only_rules
                .iter()
                .chain(&lists.analyzer_rules)
                .cloned()
                .collect();
            warn_about_duplicates(&only);
            return Ok(Self::Only(only.into_iter().collect()));
        }

        warn_about_duplicates(&lists.disabled_rules);
        let opt_in = expand_all(&lists.opt_in_rules, catalog, |c| {
            c.contains(Capabilities::OPT_IN) && !c.contains(Capabilities::ANALYZER_ONLY)
        });
        let analyzer = expand_all(&lists.analyzer_rules, catalog, |c| {
            c.contains(Capabilities::ANALYZER_ONLY)
        });
        let enabled: Vec<String> = opt_in.into_iter().chain(analyzer).collect();
        warn_about_duplicates(&enabled);
        Ok(Self::Default {
            disabled: lists.disabled_rules.iter().cloned().collect(),
            opt_in: enabled.into_iter().collect(),
        })
    }

    /// Rewrites deprecated aliases into canonical identifiers.
    #[must_use]
    pub fn applied(&self, catalog: &RuleCatalog) -> Self {
        let canonical = |ids: &BTreeSet<String>| -> BTreeSet<String> {
            ids.iter()
                .map(|id| catalog.identifier_for(id).map_or_else(|| id.clone(), str::to_string))
                .collect()
        };
        match self {
            Self::Default { disabled, opt_in } => Self::Default {
                disabled: canonical(disabled),
                opt_in: canonical(opt_in),
            },
            Self::Only(ids) => Self::Only(canonical(ids)),
            Self::OnlyCommandLine(ids) => Self::OnlyCommandLine(canonical(ids)),
            Self::AllCommandLine => Self::AllCommandLine,
        }
    }

    /// Every identifier the mode names.
    #[must_use]
    pub fn named_identifiers(&self) -> BTreeSet<&str> {
        match self {
            Self::Default { disabled, opt_in } => {
                disabled.iter().chain(opt_in).map(String::as_str).collect()
            }
            Self::Only(ids) | Self::OnlyCommandLine(ids) => ids.iter().map(String::as_str).collect(),
            Self::AllCommandLine => BTreeSet::new(),
        }
    }

    /// Mode of a child configuration applied on top of this one.
    ///
    /// `child_custom_identifiers` are the custom rule identifiers the child
    /// configures. They join an `only_rules` parent that enables custom rules.
    #[must_use]
    pub fn merged(
        &self,
        child: &Self,
        catalog: &RuleCatalog,
        child_custom_identifiers: &[String],
    ) -> Self {
        let (child_disabled, child_opt_in) = match child {
            Self::Default { disabled, opt_in } => (disabled, opt_in),
            Self::Only(_) | Self::OnlyCommandLine(_) | Self::AllCommandLine => {
                return match self {
                    Self::OnlyCommandLine(_) | Self::AllCommandLine => self.clone(),
                    _ => child.clone(),
                };
            }
        };

        match self {
            Self::Default { disabled, opt_in } => {
                let is_opt_in = |id: &str| {
                    catalog.description(id).is_some_and(|d| {
                        d.has(Capabilities::OPT_IN) || d.has(Capabilities::ANALYZER_ONLY)
                    })
                };
                let merged_disabled = child_disabled
                    .iter()
                    .chain(disabled.difference(child_opt_in))
                    .filter(|id| !is_opt_in(id.as_str()))
                    .cloned()
                    .collect();
                let merged_opt_in = child_opt_in
                    .iter()
                    .chain(opt_in.difference(child_disabled))
                    .filter(|id| is_opt_in(id.as_str()))
                    .cloned()
                    .collect();
                Self::Default {
                    disabled: merged_disabled,
                    opt_in: merged_opt_in,
                }
            }
            Self::Only(only) => {
                let mut only = only.clone();
                if only.contains(CUSTOM_RULES) {
                    only.extend(child_custom_identifiers.iter().cloned());
                }
                let merged = child_opt_in
                    .iter()
                    .chain(only.difference(child_disabled))
                    .cloned()
                    .collect();
                Self::Only(merged)
            }
            Self::OnlyCommandLine(_) | Self::AllCommandLine => self.clone(),
        }
    }
}

/// Identifier of the rule hosting user-defined regex rules.
pub const CUSTOM_RULES: &str = "custom_rules";

fn expand_all(
    identifiers: &[String],
    catalog: &RuleCatalog,
    qualifies: impl Fn(Capabilities) -> bool,
) -> Vec<String> {
    if !identifiers.iter().any(|id| id == ALL_RULES) {
        return identifiers.to_vec();
    }
    let mut expanded: BTreeSet<String> = identifiers
        .iter()
        .filter(|id| *id != ALL_RULES)
        .cloned()
        .collect();
    expanded.extend(
        catalog
            .rule_descriptions()
            .into_iter()
            .filter(|d| qualifies(d.capabilities))
            .map(|d| d.identifier.to_string()),
    );
    expanded.into_iter().collect()
}

fn warn_about_duplicates(identifiers: &[String]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for id in identifiers {
        *counts.entry(id.as_str()).or_default() += 1;
    }
    for (id, times) in counts.into_iter().filter(|(_, n)| *n > 1) {
        Issue::ListedMultipleTimes {
            rule_id: id.to_string(),
            times,
        }
        .print();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_command_line_modes_take_precedence() {
        let catalog = RuleCatalog::new();
        let lists = RuleLists {
            enable_all_rules: true,
            only_rules: strings(&["a"]),
            ..RuleLists::default()
        };
        assert_eq!(RulesMode::new(&lists, &catalog).unwrap(), RulesMode::AllCommandLine);

        let lists = RuleLists {
            only_rule: strings(&["b"]),
            disabled_rules: strings(&["c"]),
            ..RuleLists::default()
        };
        assert_eq!(
            RulesMode::new(&lists, &catalog).unwrap(),
            RulesMode::OnlyCommandLine(set(&["b"]))
        );
    }

    #[test]
    fn test_only_rules_cannot_be_combined() {
        let catalog = RuleCatalog::new();
        let lists = RuleLists {
            only_rules: strings(&["a"]),
            disabled_rules: strings(&["b"]),
            ..RuleLists::default()
        };
        assert!(matches!(
            RulesMode::new(&lists, &catalog),
            Err(Issue::OnlyRulesCombined)
        ));
    }

    #[test]
    fn test_only_rules_include_analyzer_rules() {
        let catalog = RuleCatalog::new();
        let lists = RuleLists {
            only_rules: strings(&["a"]),
            analyzer_rules: strings(&["z"]),
            ..RuleLists::default()
        };
        assert_eq!(
            RulesMode::new(&lists, &catalog).unwrap(),
            RulesMode::Only(set(&["a", "z"]))
        );
    }

    #[test]
    fn test_child_only_mode_wins() {
        let catalog = RuleCatalog::new();
        let parent = RulesMode::Default {
            disabled: set(&["a"]),
            opt_in: BTreeSet::new(),
        };
        let child = RulesMode::Only(set(&["b"]));
        assert_eq!(parent.merged(&child, &catalog, &[]), child);
    }

    #[test]
    fn test_command_line_parent_is_kept() {
        let catalog = RuleCatalog::new();
        let child = RulesMode::Default {
            disabled: set(&["a"]),
            opt_in: BTreeSet::new(),
        };
        assert_eq!(
            RulesMode::AllCommandLine.merged(&child, &catalog, &[]),
            RulesMode::AllCommandLine
        );
    }

    #[test]
    fn test_default_child_over_only_parent() {
        let catalog = RuleCatalog::new();
        let parent = RulesMode::Only(set(&["a", "b", CUSTOM_RULES]));
        let child = RulesMode::Default {
            disabled: set(&["a"]),
            opt_in: set(&["c"]),
        };
        assert_eq!(
            parent.merged(&child, &catalog, &strings(&["my_rule"])),
            RulesMode::Only(set(&["b", "c", CUSTOM_RULES, "my_rule"]))
        );
    }

    #[test]
    fn test_default_child_over_default_parent() {
        let catalog = RuleCatalog::new();
        let parent = RulesMode::Default {
            disabled: set(&["superfluous_disable_command"]),
            opt_in: BTreeSet::new(),
        };
        let child = RulesMode::Default {
            disabled: set(&["invalid_swiftlint_command"]),
            opt_in: BTreeSet::new(),
        };
        assert_eq!(
            parent.merged(&child, &catalog, &[]),
            RulesMode::Default {
                disabled: set(&["invalid_swiftlint_command", "superfluous_disable_command"]),
                opt_in: BTreeSet::new(),
            }
        );
    }
}
