//! Registry of every rule the engine knows about.
//!
//! The catalog is an explicit value built once at start-up and handed to the
//! resolver and the pipeline. It maps identifiers and deprecated aliases to
//! constructors.

use crate::config::Document;
use crate::issue::Issue;
use crate::meta_rules::{InvalidCommandRule, SuperfluousDisableCommandRule};
use crate::rule::{ConfigurableRule, RuleDescription, SharedRule};
use crate::rule_configuration::RuleConfigurationError;
use serde_yaml::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Constructor = fn(Option<&Value>) -> Result<SharedRule, RuleConfigurationError>;

/// Constructor of one rule type.
#[derive(Clone, Copy)]
pub struct RuleFactory {
    description: &'static RuleDescription,
    build: Constructor,
}

impl RuleFactory {
    /// Factory for a rule type.
    #[must_use]
    pub fn of<R: ConfigurableRule>() -> Self {
        Self {
            description: R::DESCRIPTION,
            build: |configuration| {
                R::from_configuration(configuration).map(|rule| Arc::new(rule) as SharedRule)
            },
        }
    }

    /// Metadata of the rule type.
    #[must_use]
    pub fn description(&self) -> &'static RuleDescription {
        self.description
    }

    /// Builds a rule from its configuration.
    ///
    /// # Errors
    ///
    /// Returns the rule's configuration error.
    pub fn build(&self, configuration: Option<&Value>) -> Result<SharedRule, RuleConfigurationError> {
        (self.build)(configuration)
    }
}

impl fmt::Debug for RuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuleFactory")
            .field(&self.description.identifier)
            .finish()
    }
}

/// A rule instance together with whether a document configured it.
#[derive(Clone)]
pub struct ConfiguredRule {
    /// The rule.
    pub rule: SharedRule,
    /// `true` if the instance was built from a non-empty configuration.
    pub configured: bool,
}

impl ConfiguredRule {
    /// Identifier of the wrapped rule.
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        self.rule.description().identifier
    }
}

impl fmt::Debug for ConfiguredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredRule")
            .field("identifier", &self.identifier())
            .field("configured", &self.configured)
            .finish()
    }
}

/// All registered rules.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    factories: Vec<RuleFactory>,
    index: HashMap<&'static str, usize>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleCatalog {
    /// Creates a catalog holding the engine's own meta rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            index: HashMap::new(),
        }
        .with::<SuperfluousDisableCommandRule>()
        .with::<InvalidCommandRule>()
    }

    /// Registers a rule type, builder style.
    #[must_use]
    pub fn with<R: ConfigurableRule>(mut self) -> Self {
        self.register(RuleFactory::of::<R>());
        self
    }

    /// Registers a factory. A later registration of the same identifier
    /// replaces the earlier one.
    pub fn register(&mut self, factory: RuleFactory) {
        let description = factory.description;
        let position = if let Some(&existing) = self.index.get(description.identifier) {
            self.factories[existing] = factory;
            existing
        } else {
            self.factories.push(factory);
            self.factories.len() - 1
        };
        for id in description.all_identifiers() {
            self.index.insert(id, position);
        }
    }

    /// Canonical identifier for an identifier or deprecated alias.
    #[must_use]
    pub fn identifier_for(&self, identifier_or_alias: &str) -> Option<&'static str> {
        self.index
            .get(identifier_or_alias)
            .map(|&i| self.factories[i].description.identifier)
    }

    /// Metadata of a rule, looked up by identifier or alias.
    #[must_use]
    pub fn description(&self, identifier_or_alias: &str) -> Option<&'static RuleDescription> {
        self.index
            .get(identifier_or_alias)
            .map(|&i| self.factories[i].description)
    }

    /// Metadata of every rule, sorted by identifier.
    #[must_use]
    pub fn rule_descriptions(&self) -> Vec<&'static RuleDescription> {
        let mut descriptions: Vec<_> = self.factories.iter().map(|f| f.description).collect();
        descriptions.sort_by_key(|d| d.identifier);
        descriptions
    }

    /// Every identifier and alias.
    #[must_use]
    pub fn all_valid_identifiers(&self) -> BTreeSet<String> {
        self.index.keys().map(|k| (*k).to_string()).collect()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds a rule with its default configuration.
    #[must_use]
    pub fn default_rule(&self, identifier: &str) -> Option<SharedRule> {
        let factory = self.index.get(identifier).map(|&i| self.factories[i])?;
        factory.build(None).ok()
    }

    /// Configures every registered rule from a document.
    ///
    /// A rule configured under more than one of its identifiers, or under the
    /// same identifier twice, is an error. A configuration the rule rejects
    /// is reported and replaced by the rule's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::DuplicatedConfigurations`].
    pub fn all_rules_wrapped(&self, document: &Document) -> Result<Vec<ConfiguredRule>, Issue> {
        let mut wrapped = Vec::with_capacity(self.factories.len());
        for factory in &self.factories {
            let description = factory.description;
            let matching: Vec<&Value> = document
                .entries()
                .iter()
                .filter(|(key, _)| description.all_identifiers().any(|id| id == key.as_str()))
                .map(|(_, value)| value)
                .collect();

            if matching.len() > 1 {
                return Err(Issue::DuplicatedConfigurations {
                    rule_id: description.identifier.to_string(),
                    aliases: description
                        .deprecated_aliases
                        .iter()
                        .map(|a| (*a).to_string())
                        .collect(),
                });
            }

            let configured = match matching.first() {
                Some(value) => match factory.build(Some(*value)) {
                    Ok(rule) => ConfiguredRule {
                        rule,
                        configured: true,
                    },
                    Err(error) => {
                        Issue::InvalidConfiguration {
                            rule_id: description.identifier.to_string(),
                            reason: Some(error.to_string()),
                        }
                        .print();
                        ConfiguredRule {
                            rule: build_default(factory)?,
                            configured: false,
                        }
                    }
                },
                None => ConfiguredRule {
                    rule: build_default(factory)?,
                    configured: false,
                },
            };
            wrapped.push(configured);
        }
        debug!("Configured {} rules", wrapped.len());
        Ok(wrapped)
    }
}

fn build_default(factory: &RuleFactory) -> Result<SharedRule, Issue> {
    factory.build(None).map_err(|error| Issue::InvalidConfiguration {
        rule_id: factory.description.identifier.to_string(),
        reason: Some(error.to_string()),
    })
}
