//! Analyzer rule for imports that cannot contribute anything.
//!
//! Only runs under `swiftlint analyze`, where compiler arguments are known.
//! Without type information the rule restricts itself to two certain cases:
//! a module imported more than once, and the module being compiled importing
//! itself (`-module-name`). Correctable.

use crate::utils::{code_matches, static_regex, violation_at};
use serde_yaml::Value;
use std::any::Any;
use std::collections::HashSet;
use std::sync::OnceLock;
use swiftlint_core::rule_configuration::{RuleConfigurationError, SeverityConfiguration};
use swiftlint_core::{
    Capabilities, ConfigurableRule, ConfigurationDescription, Correction, Rule, RuleContext,
    RuleDescription, RuleKind, Severity, SourceFile, StyleViolation, SwiftVersion,
};

/// Metadata of [`UnusedImport`].
pub static UNUSED_IMPORT: RuleDescription = RuleDescription {
    identifier: "unused_import",
    name: "Unused Import",
    description: "All imported modules should be required to make the file compile",
    kind: RuleKind::Lint,
    deprecated_aliases: &[],
    min_swift_version: SwiftVersion::FIVE,
    capabilities: Capabilities::ANALYZER_ONLY.union(Capabilities::CORRECTABLE),
};

/// Flags duplicate and self imports.
#[derive(Debug, Clone)]
pub struct UnusedImport {
    configuration: SeverityConfiguration,
}

impl Default for UnusedImport {
    fn default() -> Self {
        Self {
            configuration: SeverityConfiguration::new(Severity::Warning),
        }
    }
}

fn module_name(compiler_arguments: &[String]) -> Option<&str> {
    compiler_arguments
        .iter()
        .position(|argument| argument == "-module-name")
        .and_then(|i| compiler_arguments.get(i + 1))
        .map(String::as_str)
}

/// `(module, byte offset of the import keyword)` of every unused import.
fn unused_imports<'f>(file: &'f SourceFile, compiler_arguments: &[String]) -> Vec<(&'f str, usize)> {
    static PATTERN: OnceLock<Option<regex::Regex>> = OnceLock::new();
    let Some(pattern) = static_regex(
        &PATTERN,
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s+)*import\s+(?:(?:typealias|struct|class|enum|protocol|let|var|func)\s+)?([A-Za-z_][A-Za-z0-9_]*)",
    ) else {
        return Vec::new();
    };
    let own_module = module_name(compiler_arguments);
    let mut seen = HashSet::new();
    code_matches(file, pattern)
        .filter_map(|offset| {
            let captures = pattern.captures_at(file.contents(), offset)?;
            let module = captures.get(1)?.as_str();
            let keyword = offset + captures.get(0)?.as_str().find("import")?;
            let duplicate = !seen.insert(module);
            (duplicate || Some(module) == own_module).then_some((module, keyword))
        })
        .collect()
}

impl Rule for UnusedImport {
    fn description(&self) -> &'static RuleDescription {
        &UNUSED_IMPORT
    }

    fn configuration_description(&self) -> ConfigurationDescription {
        ConfigurationDescription::new().severity(self.configuration.severity)
    }

    fn validate(&self, file: &SourceFile, ctx: &RuleContext<'_>) -> Vec<StyleViolation> {
        unused_imports(file, ctx.compiler_arguments)
            .into_iter()
            .map(|(module, offset)| {
                violation_at(
                    &UNUSED_IMPORT,
                    self.configuration.severity,
                    file,
                    offset,
                    format!("Module '{module}' is not required to compile this file"),
                )
            })
            .collect()
    }

    fn correct(&self, file: &SourceFile, ctx: &RuleContext<'_>) -> Option<(String, Vec<Correction>)> {
        let unused = unused_imports(file, ctx.compiler_arguments);
        if unused.is_empty() {
            return None;
        }
        let lines: HashSet<usize> = unused
            .iter()
            .map(|(_, offset)| file.line_and_character(*offset).0)
            .collect();
        let mut corrected = String::with_capacity(file.contents().len());
        let mut rest = file.contents();
        for line in file.lines() {
            let raw_length = rest.find('\n').map_or(rest.len(), |i| i + 1);
            let (raw, tail) = rest.split_at(raw_length);
            rest = tail;
            if !lines.contains(&line.index) {
                corrected.push_str(raw);
            }
        }
        let corrections = unused
            .iter()
            .map(|(_, offset)| Correction {
                rule_identifier: UNUSED_IMPORT.identifier.to_string(),
                location: file.location(*offset),
            })
            .collect();
        Some((corrected, corrections))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableRule for UnusedImport {
    const DESCRIPTION: &'static RuleDescription = &UNUSED_IMPORT;

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
    use swiftlint_core::RuleStorage;

    fn arguments() -> Vec<String> {
        ["-module-name", "App", "-sdk", "/sdk"].map(String::from).to_vec()
    }

    const SOURCE: &str = "import Foundation\n@testable import App\nimport UIKit\nimport Foundation\n\nlet a = 1\n";

    #[test]
    fn test_duplicate_and_self_imports() {
        let storage = RuleStorage::new();
        let arguments = arguments();
        let ctx = RuleContext::new(&storage, &arguments, UNUSED_IMPORT.identifier);
        let violations = UnusedImport::default().validate(&SourceFile::virtual_file(SOURCE), &ctx);
        let found: Vec<(Option<usize>, &str)> = violations
            .iter()
            .map(|v| (v.location.line, v.reason.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (Some(2), "Module 'App' is not required to compile this file"),
                (Some(4), "Module 'Foundation' is not required to compile this file"),
            ]
        );
    }

    #[test]
    fn test_correction_removes_lines() {
        let storage = RuleStorage::new();
        let arguments = arguments();
        let ctx = RuleContext::new(&storage, &arguments, UNUSED_IMPORT.identifier);
        let (contents, corrections) = UnusedImport::default()
            .correct(&SourceFile::virtual_file(SOURCE), &ctx)
            .unwrap();
        assert_eq!(contents, "import Foundation\nimport UIKit\n\nlet a = 1\n");
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_is_analyzer_only() {
        assert!(UNUSED_IMPORT.has(Capabilities::ANALYZER_ONLY));
        assert!(module_name(&[]).is_none());
    }
}
