//! User-defined regex rules.
//!
//! Every entry under `custom_rules` becomes a rule of its own: its identifier
//! can be listed in `disabled_rules` or `only_rules` and named in
//! `swiftlint:disable` commands, and its violations carry that identifier.
//!
//! ```yaml
//! custom_rules:
//!   no_print:
//!     name: "No Print"
//!     regex: "\\bprint\\("
//!     message: "Use the logger instead"
//!     severity: error
//!     match_kinds: [identifier]
//!     excluded: "Tests/"
//! ```

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use swiftlint_core::rule_configuration::{
    as_mapping, as_string, as_string_list, as_usize, check_keys, severity_in, OptionValue,
    RuleConfigurationError,
};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Rule, RuleContext, RuleDescription,
    RuleKind, Severity, SharedRule, SourceFile, StyleViolation, SwiftVersion, CUSTOM_RULES,
};

/// Metadata of [`CustomRules`].
pub static CUSTOM_RULES_DESCRIPTION: RuleDescription = RuleDescription {
    identifier: CUSTOM_RULES,
    name: "Custom Rules",
    description: "Create custom rules by providing a regex string. Optionally specify what \
                  syntax kinds to match against, the severity level, and what message to \
                  display.",
    kind: RuleKind::Style,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::NONE,
};

const KEYS: &[&str] = &[
    "regex",
    "name",
    "message",
    "severity",
    "included",
    "excluded",
    "match_kinds",
    "excluded_match_kinds",
    "capture_group",
];

/// What a match position lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum MatchKind {
    Comment,
    String,
    Code,
}

impl MatchKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "comment" | "comment.mark" | "comment.url" | "doccomment" | "doccomment.field" => {
                Self::Comment
            }
            "string" => Self::String,
            _ => Self::Code,
        }
    }

    fn of(file: &SourceFile, offset: usize) -> Self {
        if file.is_in_comment(offset) {
            Self::Comment
        } else if file.is_in_comment_or_string(offset) {
            Self::String
        } else {
            Self::Code
        }
    }
}

/// One user-defined rule.
#[derive(Debug, Clone)]
struct RegexRule {
    identifier: String,
    name: Option<String>,
    message: Option<String>,
    regex: Regex,
    severity: Severity,
    included: Vec<Regex>,
    excluded: Vec<Regex>,
    match_kinds: Option<BTreeSet<MatchKind>>,
    written_kinds: Vec<String>,
    capture_group: usize,
}

fn compile(key: &str, pattern: &str) -> Result<Regex, RuleConfigurationError> {
    Regex::new(pattern)
        .map_err(|error| RuleConfigurationError::Inconsistent(format!("invalid regex for '{key}': {error}")))
}

fn compile_all(key: &str, value: Option<&Value>) -> Result<Vec<Regex>, RuleConfigurationError> {
    value
        .map(|v| as_string_list(key, v))
        .transpose()?
        .unwrap_or_default()
        .iter()
        .map(|pattern| compile(key, pattern))
        .collect()
}

impl RegexRule {
    fn parse(identifier: &str, map: &Mapping) -> Result<Self, RuleConfigurationError> {
        check_keys(map, KEYS)?;
        let pattern = map
            .get("regex")
            .ok_or_else(|| RuleConfigurationError::Inconsistent(format!("'{identifier}' has no regex")))
            .and_then(|v| as_string("regex", v))?;
        if map.contains_key("match_kinds") && map.contains_key("excluded_match_kinds") {
            return Err(RuleConfigurationError::Inconsistent(format!(
                "'{identifier}' cannot combine 'match_kinds' and 'excluded_match_kinds'"
            )));
        }

        let mut written_kinds = Vec::new();
        let match_kinds = if let Some(kinds) = map.get("match_kinds") {
            written_kinds = as_string_list("match_kinds", kinds)?;
            Some(written_kinds.iter().map(|k| MatchKind::parse(k)).collect())
        } else if let Some(kinds) = map.get("excluded_match_kinds") {
            written_kinds = as_string_list("excluded_match_kinds", kinds)?;
            let excluded: BTreeSet<MatchKind> = written_kinds.iter().map(|k| MatchKind::parse(k)).collect();
            Some(
                [MatchKind::Comment, MatchKind::String, MatchKind::Code]
                    .into_iter()
                    .filter(|k| !excluded.contains(k))
                    .collect(),
            )
        } else {
            None
        };

        Ok(Self {
            identifier: identifier.to_string(),
            name: map.get("name").map(|v| as_string("name", v)).transpose()?,
            message: map.get("message").map(|v| as_string("message", v)).transpose()?,
            regex: compile("regex", &pattern)?,
            severity: severity_in(map)?.unwrap_or(Severity::Warning),
            included: compile_all("included", map.get("included"))?,
            excluded: compile_all("excluded", map.get("excluded"))?,
            match_kinds,
            written_kinds,
            capture_group: map
                .get("capture_group")
                .map(|v| as_usize("capture_group", v))
                .transpose()?
                .unwrap_or(0),
        })
    }

    fn applies_to(&self, file: &SourceFile) -> bool {
        let Some(path) = file.path() else {
            return self.included.is_empty();
        };
        let path = path.to_string_lossy();
        (self.included.is_empty() || self.included.iter().any(|r| r.is_match(&path)))
            && !self.excluded.iter().any(|r| r.is_match(&path))
    }

    fn validate(&self, file: &SourceFile) -> Vec<StyleViolation> {
        if !self.applies_to(file) {
            return Vec::new();
        }
        self.regex
            .captures_iter(file.contents())
            .filter_map(|captures| captures.get(self.capture_group))
            .map(|m| m.start())
            .filter(|offset| {
                self.match_kinds
                    .as_ref()
                    .map_or(true, |kinds| kinds.contains(&MatchKind::of(file, *offset)))
            })
            .map(|offset| {
                StyleViolation::new(
                    self.identifier.clone(),
                    self.name.clone().unwrap_or_else(|| self.identifier.clone()),
                    self.severity,
                    file.location(offset),
                    self.message.clone().unwrap_or_else(|| "Regex matched".to_string()),
                )
            })
            .collect()
    }

    fn describe(&self) -> ConfigurationDescription {
        let mut description = ConfigurationDescription::new()
            .with("regex", self.regex.as_str())
            .severity(self.severity);
        if let Some(name) = &self.name {
            description = description.with("name", name.as_str());
        }
        if let Some(message) = &self.message {
            description = description.with("message", message.as_str());
        }
        let patterns = |regexes: &[Regex]| regexes.iter().map(|r| r.as_str().to_string()).collect();
        if !self.included.is_empty() {
            description = description.with("included", OptionValue::List(patterns(&self.included)));
        }
        if !self.excluded.is_empty() {
            description = description.with("excluded", OptionValue::List(patterns(&self.excluded)));
        }
        if !self.written_kinds.is_empty() {
            description = description.with("match_kinds", OptionValue::List(self.written_kinds.clone()));
        }
        if self.capture_group > 0 {
            description = description.with("capture_group", self.capture_group);
        }
        description
    }
}

/// Host of every user-defined regex rule.
#[derive(Debug, Clone, Default)]
pub struct CustomRules {
    rules: BTreeMap<String, RegexRule>,
}

impl CustomRules {
    /// Identifiers of the hosted rules, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }
}

impl Rule for CustomRules {
    fn description(&self) -> &'static RuleDescription {
        &CUSTOM_RULES_DESCRIPTION
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        self.rules
            .values()
            .fold(ConfigurationDescription::new(), |description, rule| {
                description.nested(rule.identifier.clone(), rule.describe())
            })
    }

    fn validate(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        self.rules.values().flat_map(|rule| rule.validate(file)).collect()
    }

    fn custom_identifiers(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    fn merged_with_child(&self, child: &dyn Rule) -> Option<SharedRule> {
        let child = child.as_any().downcast_ref::<Self>()?;
        let mut rules = self.rules.clone();
        rules.extend(child.rules.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(Arc::new(Self { rules }))
    }

    fn restricted_to(&self, identifiers: &dyn Fn(&str) -> bool) -> Option<SharedRule> {
        let rules: BTreeMap<String, RegexRule> = self
            .rules
            .iter()
            .filter(|(id, _)| identifiers(id))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (!rules.is_empty()).then(|| Arc::new(Self { rules }) as SharedRule)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for CustomRules {
    const DESCRIPTION: &'static RuleDescription = &CUSTOM_RULES_DESCRIPTION;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        let Some(value) = configuration else {
            return Ok(Self::default());
        };
        let mut rules = BTreeMap::new();
        for (key, entry) in as_mapping(CUSTOM_RULES, value)? {
            let identifier = as_string(CUSTOM_RULES, key)?;
            let entry = as_mapping(&identifier, entry)?;
            rules.insert(identifier.clone(), RegexRule::parse(&identifier, entry)?);
        }
        Ok(Self { rules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swiftlint_core::RuleStorage;

    fn custom(yaml: &str) -> CustomRules {
        CustomRules::from_configuration(Some(&serde_yaml::from_str(yaml).unwrap())).unwrap()
    }

    fn lint(rule: &dyn Rule, path: Option<&str>, source: &str) -> Vec<(String, usize, String)> {
        let storage = RuleStorage::new();
        let file = SourceFile::new(path.map(Into::into), source);
        rule.validate(&file, &RuleContext::new(&storage, &[], CUSTOM_RULES))
            .into_iter()
            .map(|v| (v.rule_identifier, v.location.line.unwrap_or(0), v.reason))
            .collect()
    }

    const CONFIG: &str = r#"
no_print:
  regex: '\bprint\('
  message: Use the logger instead
  severity: error
no_force_unwrap_comment:
  regex: 'HACK'
  match_kinds: comment
"#;

    #[test]
    fn test_violations_carry_the_custom_identifier() {
        let rules = custom(CONFIG);
        let violations = lint(&rules, None, "print(\"HACK\")\n// HACK\n");
        assert_eq!(
            violations,
            vec![
                ("no_force_unwrap_comment".to_string(), 2, "Regex matched".to_string()),
                ("no_print".to_string(), 1, "Use the logger instead".to_string()),
            ]
        );
        assert_eq!(rules.custom_identifiers(), vec!["no_force_unwrap_comment", "no_print"]);
    }

    #[test]
    fn test_excluded_match_kinds() {
        let rules = custom("no_foo:\n  regex: foo\n  excluded_match_kinds: [comment, string]\n");
        assert_eq!(lint(&rules, None, "foo()\n// foo\nlet s = \"foo\"\n").len(), 1);
    }

    #[test]
    fn test_included_and_excluded_paths() {
        let rules = custom("no_foo:\n  regex: foo\n  included: Sources/\n  excluded: Generated\n");
        assert_eq!(lint(&rules, Some("/p/Sources/A.swift"), "foo\n").len(), 1);
        assert!(lint(&rules, Some("/p/Tests/A.swift"), "foo\n").is_empty());
        assert!(lint(&rules, Some("/p/Sources/Generated/A.swift"), "foo\n").is_empty());
    }

    #[test]
    fn test_invalid_entries_are_rejected() {
        for yaml in [
            "bad:\n  message: no regex\n",
            "bad:\n  regex: '('\n",
            "bad:\n  regex: a\n  bogus: 1\n",
            "bad:\n  regex: a\n  match_kinds: comment\n  excluded_match_kinds: string\n",
        ] {
            assert!(
                CustomRules::from_configuration(Some(&serde_yaml::from_str(yaml).unwrap())).is_err(),
                "{yaml}"
            );
        }
    }

    #[test]
    fn test_merge_prefers_child_entries() {
        let parent = custom("a:\n  regex: parent\nb:\n  regex: b\n");
        let child = custom("a:\n  regex: child\nc:\n  regex: zzz\n");
        let merged = parent.merged_with_child(&child).unwrap();
        assert_eq!(merged.custom_identifiers(), vec!["a", "b", "c"]);
        assert_eq!(lint(merged.as_ref(), None, "child parent\n").len(), 1);
    }

    #[test]
    fn test_restriction() {
        let rules = custom(CONFIG);
        let restricted = rules.restricted_to(&|id: &str| id == "no_print").unwrap();
        assert_eq!(restricted.custom_identifiers(), vec!["no_print"]);
        assert!(rules.restricted_to(&|_: &str| false).is_none());
    }

    #[test]
    fn test_description_changes_with_regex() {
        let a = custom("a:\n  regex: one\n").configuration_description().one_line();
        let b = custom("a:\n  regex: two\n").configuration_description().one_line();
        assert_ne!(a, b);
        assert_eq!(a, "a: {regex: \"one\"; severity: warning}");
    }
}
