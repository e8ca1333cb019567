//! Configured rule instances and the subset a rules mode enables.

use super::rules_mode::{RulesMode, CUSTOM_RULES};
use crate::catalog::{ConfiguredRule, RuleCatalog};
use crate::command::ALL_RULES;
use crate::issue::Issue;
use crate::rule::{Capabilities, SharedRule};
use crate::session::LintSession;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Every configured rule plus the mode selecting the ones that run.
#[derive(Clone)]
pub struct RulesWrapper {
    mode: RulesMode,
    all_rules_wrapped: Vec<ConfiguredRule>,
    catalog: Arc<RuleCatalog>,
    session: Arc<LintSession>,
    resulting_rules: OnceLock<Vec<SharedRule>>,
}

impl fmt::Debug for RulesWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesWrapper")
            .field("mode", &self.mode)
            .field("rules", &self.all_rules_wrapped.len())
            .finish_non_exhaustive()
    }
}

impl RulesWrapper {
    /// Wraps configured rules. Aliases in `mode` are resolved.
    #[must_use]
    pub fn new(
        mode: &RulesMode,
        all_rules_wrapped: Vec<ConfiguredRule>,
        catalog: Arc<RuleCatalog>,
        session: Arc<LintSession>,
    ) -> Self {
        Self {
            mode: mode.applied(&catalog),
            all_rules_wrapped,
            catalog,
            session,
            resulting_rules: OnceLock::new(),
        }
    }

    /// The rules mode, with canonical identifiers.
    #[must_use]
    pub fn mode(&self) -> &RulesMode {
        &self.mode
    }

    /// Every registered rule as configured, enabled or not.
    #[must_use]
    pub fn all_rules_wrapped(&self) -> &[ConfiguredRule] {
        &self.all_rules_wrapped
    }

    /// Identifiers of the user-defined rules hosted by `custom_rules`.
    #[must_use]
    pub fn custom_rule_identifiers(&self) -> Vec<String> {
        self.all_rules_wrapped
            .iter()
            .find(|r| r.identifier() == CUSTOM_RULES)
            .map(|r| r.rule.custom_identifiers())
            .unwrap_or_default()
    }

    /// The rules that run, sorted by identifier.
    ///
    /// Identifiers the mode names that no rule has are reported once per
    /// session and ignored.
    pub fn resulting_rules(&self) -> &[SharedRule] {
        self.resulting_rules.get_or_init(|| self.compute_resulting_rules())
    }

    fn compute_resulting_rules(&self) -> Vec<SharedRule> {
        let custom_identifiers = self.custom_rule_identifiers();
        self.report_invalid_identifiers(&custom_identifiers);

        let mut rules: Vec<SharedRule> = match &self.mode {
            RulesMode::AllCommandLine => self.all_rules_wrapped.iter().map(|r| r.rule.clone()).collect(),
            RulesMode::Only(only) | RulesMode::OnlyCommandLine(only) => self
                .all_rules_wrapped
                .iter()
                .filter_map(|wrapped| {
                    let id = wrapped.identifier();
                    if id == CUSTOM_RULES && !only.contains(CUSTOM_RULES) {
                        return wrapped.rule.restricted_to(&|custom: &str| only.contains(custom));
                    }
                    only.contains(id).then(|| wrapped.rule.clone())
                })
                .collect(),
            RulesMode::Default { disabled, opt_in } => self
                .all_rules_wrapped
                .iter()
                .filter_map(|wrapped| {
                    let id = wrapped.identifier();
                    let description = wrapped.rule.description();
                    let is_opt_in = description.has(Capabilities::OPT_IN)
                        || description.has(Capabilities::ANALYZER_ONLY);
                    if disabled.contains(id) || (is_opt_in && !opt_in.contains(id)) {
                        return None;
                    }
                    if id == CUSTOM_RULES && custom_identifiers.iter().any(|c| disabled.contains(c)) {
                        return wrapped.rule.restricted_to(&|custom: &str| !disabled.contains(custom));
                    }
                    Some(wrapped.rule.clone())
                })
                .collect(),
        };
        rules.sort_by_key(|r| r.description().identifier);
        rules
    }

    fn report_invalid_identifiers(&self, custom_identifiers: &[String]) {
        let valid = self.catalog.all_valid_identifiers();
        let invalid: Vec<&str> = self
            .mode
            .named_identifiers()
            .into_iter()
            .filter(|id| *id != ALL_RULES && !valid.contains(*id))
            .filter(|id| !custom_identifiers.iter().any(|c| c.as_str() == *id))
            .collect();
        if invalid.is_empty() {
            return;
        }
        for id in &invalid {
            self.session.report_once(&Issue::InvalidRuleIdentifier {
                rule_id: (*id).to_string(),
            });
        }
        if self.session.first_time("valid-rule-identifiers") {
            let listing: Vec<String> = valid.iter().cloned().chain(custom_identifiers.iter().cloned()).collect();
            info!("Valid rule identifiers:\n{}", listing.join("\n"));
        }
    }

    /// Applies a child's rules on top of these.
    ///
    /// A rule the child configured replaces the parent's instance, or is
    /// merged with it when the rule supports merging.
    #[must_use]
    pub fn merged(&self, child: &Self) -> Self {
        let all_rules_wrapped = self
            .all_rules_wrapped
            .iter()
            .map(|parent| {
                let Some(child_rule) = child
                    .all_rules_wrapped
                    .iter()
                    .find(|c| c.identifier() == parent.identifier())
                else {
                    return parent.clone();
                };
                if !child_rule.configured {
                    return parent.clone();
                }
                let rule = if parent.configured {
                    parent
                        .rule
                        .merged_with_child(child_rule.rule.as_ref())
                        .unwrap_or_else(|| child_rule.rule.clone())
                } else {
                    child_rule.rule.clone()
                };
                ConfiguredRule {
                    rule,
                    configured: true,
                }
            })
            .chain(child.all_rules_wrapped.iter().filter(|c| {
                !self
                    .all_rules_wrapped
                    .iter()
                    .any(|p| p.identifier() == c.identifier())
            }).cloned())
            .collect();

        let mode = self
            .mode
            .merged(&child.mode, &self.catalog, &child.custom_rule_identifiers());

        Self {
            mode,
            all_rules_wrapped,
            catalog: self.catalog.clone(),
            session: self.session.clone(),
            resulting_rules: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Document;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn wrapper(mode: RulesMode, yaml: &str) -> RulesWrapper {
        let catalog = Arc::new(RuleCatalog::new());
        let rules = catalog
            .all_rules_wrapped(&Document::parse(yaml).unwrap())
            .unwrap();
        RulesWrapper::new(&mode, rules, catalog, Arc::new(LintSession::new()))
    }

    fn ids(wrapper: &RulesWrapper) -> Vec<&'static str> {
        wrapper
            .resulting_rules()
            .iter()
            .map(|r| r.description().identifier)
            .collect()
    }

    #[test]
    fn test_default_mode_runs_everything_not_disabled() {
        let wrapper = wrapper(
            RulesMode::Default {
                disabled: ["invalid_swiftlint_command".to_string()].into(),
                opt_in: BTreeSet::new(),
            },
            "",
        );
        assert_eq!(ids(&wrapper), vec!["superfluous_disable_command"]);
    }

    #[test]
    fn test_only_mode() {
        let wrapper = wrapper(
            RulesMode::Only(["invalid_swiftlint_command".to_string(), "bogus".to_string()].into()),
            "",
        );
        assert_eq!(ids(&wrapper), vec!["invalid_swiftlint_command"]);
    }

    #[test]
    fn test_child_configuration_replaces_parent_rule() {
        let parent = wrapper(RulesMode::default(), "superfluous_disable_command: error\n");
        let child = wrapper(RulesMode::default(), "invalid_swiftlint_command: error\n");
        let merged = parent.merged(&child);
        let descriptions: Vec<String> = merged
            .resulting_rules()
            .iter()
            .map(|r| r.configuration_description().one_line())
            .collect();
        assert_eq!(descriptions, vec!["severity: error", "severity: error"]);
    }
}
