//! Opt-in collecting rule: a type name should be declared in a single file.
//!
//! The collect phase records the top-level type names of every file. The
//! validate phase then reports declarations whose name was also collected
//! from another file.

use crate::utils::{code_matches, static_regex, violation_at};
use serde_yaml::Value;
use std::any::Any;
use std::sync::{Arc, OnceLock};
use swiftlint_core::rule_configuration::{RuleConfigurationError, SeverityConfiguration};
use swiftlint_core::{
    Capabilities, CollectedInfo, ConfigurableRule, ConfigurationDescription, Rule, RuleContext,
    RuleDescription, RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`TypeNameCollision`].
pub static TYPE_NAME_COLLISION: RuleDescription = RuleDescription {
    identifier: "type_name_collision",
    name: "Type Name Collision",
    description: "Types should not be declared with the same name in more than one file",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::COLLECTING.union(Capabilities::OPT_IN),
};

/// Names declared by one file, with their byte offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredTypes(pub Vec<(String, usize)>);

/// Reports types declared in more than one file.
#[derive(Debug, Clone)]
pub struct TypeNameCollision {
    configuration: SeverityConfiguration,
}

impl Default for TypeNameCollision {
    fn default() -> Self {
        Self {
            configuration: SeverityConfiguration::new(Severity::Warning),
        }
    }
}

fn declarations(file: &SourceFile) -> DeclaredTypes {
    static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
    let Some(pattern) = static_regex(
        &PATTERN,
        r"(?m)^(?:(?:public|internal|fileprivate|private|open|final)\s+)*(?:class|struct|enum|protocol|actor)\s+([A-Za-z_][A-Za-z0-9_]*)",
    ) else {
        return DeclaredTypes::default();
    };
    let names = code_matches(file, pattern)
        .filter_map(|offset| {
            let captures = pattern.captures_at(file.contents(), offset)?;
            let name = captures.get(1)?;
            Some((name.as_str().to_string(), name.start()))
        })
        .collect();
    DeclaredTypes(names)
}

impl Rule for TypeNameCollision {
    fn description(&self) -> &'static RuleDescription {
        &TYPE_NAME_COLLISION
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn collect(&self, file: &SourceFile, _ctx: &RuleContext<'_>) -> Option<CollectedInfo> {
        let declared = declarations(file);
        (!declared.0.is_empty()).then(|| Arc::new(declared) as CollectedInfo)
    }

    fn validate(&self, file: &SourceFile, ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        let Some(path) = file.path() else {
            return Vec::new();
        };
        let others = ctx.collected::<DeclaredTypes>();
        declarations(file)
            .0
            .into_iter()
            .filter_map(|(name, offset)| {
                let other = others
                    .iter()
                    .filter(|(other_path, _)| other_path != path)
                    .find(|(_, declared)| declared.0.iter().any(|(n, _)| *n == name))?;
                Some(violation_at(
                    &TYPE_NAME_COLLISION,
                    self.configuration.severity,
                    file,
                    offset,
                    format!("Type '{name}' is also declared in {}", other.0.display()),
                ))
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for TypeNameCollision {
    const DESCRIPTION: &'static RuleDescription = &TYPE_NAME_COLLISION;

    fn from_configuration(configuration: Option<&Value>) -> Result<Self, RuleConfigurationError> {
        Ok(Self {
            configuration: crate::utils::severity_only(configuration, Severity::Warning)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use swiftlint_core::RuleStorage;

    fn collect(storage: &RuleStorage, rule: &TypeNameCollision, file: &SourceFile) {
        let ctx = RuleContext::new(storage, &[], TYPE_NAME_COLLISION.identifier);
        if let Some(info) = rule.collect(file, &ctx) {
            storage.collect(TYPE_NAME_COLLISION.identifier, file.path().unwrap(), info);
        }
    }

    #[test]
    fn test_declarations() {
        let file = SourceFile::virtual_file(
            "public final class Foo {}\nstruct Bar {\n    enum Nested {}\n}\n// class Commented {}\n",
        );
        let names: Vec<String> = declarations(&file).0.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Foo", "Bar"]);
    }

    #[test]
    fn test_collision_across_files() {
        let storage = RuleStorage::new();
        let rule = TypeNameCollision::default();
        let a = SourceFile::new(Some("/p/A.swift".into()), "struct Model {}\nstruct OnlyA {}\n");
        let b = SourceFile::new(Some("/p/B.swift".into()), "class Model {}\n");
        collect(&storage, &rule, &a);
        collect(&storage, &rule, &b);

        let ctx = RuleContext::new(&storage, &[], TYPE_NAME_COLLISION.identifier);
        let violations = rule.validate(&a, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].reason, "Type 'Model' is also declared in /p/B.swift");
        assert_eq!(violations[0].location.file.as_deref(), Some(Path::new("/p/A.swift")));
        assert_eq!(rule.validate(&b, &ctx).len(), 1);
    }
}
