//! Integration test: configuration → lintable files → linter → baseline,
//! with the built-in rule catalog.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swiftlint_core::{
    Baseline, CollectedLinter, Configuration, ConfigurationResolver, Issue, LintSession, Linter,
    LinterCache, ResolveOptions, RuleStorage, SourceFile, StyleViolation, DEFAULT_FILE_NAME,
};
use swiftlint_rules::builtin_catalog;
use tempfile::TempDir;

fn resolve(root: &Path) -> Configuration {
    resolve_with(ResolveOptions::new(root))
}

fn resolve_with(options: ResolveOptions) -> Configuration {
    ConfigurationResolver::new(Arc::new(builtin_catalog()), Arc::new(LintSession::new()))
        .resolve(&options)
        .expect("configuration should resolve")
}

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Lints every lintable file the way `swiftlint lint` does: collect all,
/// then validate all.
fn lint(configuration: &Configuration, cache: Option<&LinterCache>) -> Vec<StyleViolation> {
    let storage = RuleStorage::new();
    let linters: Vec<CollectedLinter<'_>> = configuration
        .lintable_files(&[], false, false)
        .into_iter()
        .map(|path| {
            let file = SourceFile::read(&path).unwrap();
            Linter::new(file, configuration, cache, Vec::new()).collect(&storage)
        })
        .collect();
    linters.iter().flat_map(CollectedLinter::style_violations).collect()
}

fn of_rule<'v>(violations: &'v [StyleViolation], rule: &str) -> Vec<&'v StyleViolation> {
    violations.iter().filter(|v| v.rule_identifier == rule).collect()
}

fn lines(violations: &[&StyleViolation]) -> Vec<Option<usize>> {
    violations.iter().map(|v| v.location.line).collect()
}

// ── Suppression commands ──

#[test]
fn disable_this_suppresses_only_its_line() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Sources/Main.swift",
        "let a = try! load() // swiftlint:disable:this force_try\nlet b = try! load()\n",
    );

    let violations = lint(&resolve(dir.path()), None);
    assert_eq!(lines(&of_rule(&violations, "force_try")), vec![Some(2)]);
    assert!(of_rule(&violations, "superfluous_disable_command").is_empty());
}

#[test]
fn disable_survives_a_file_the_tokenizer_rejects() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), DEFAULT_FILE_NAME, "only_rules: [file_length]\nfile_length:\n  warning: 1\n");
    write(
        dir.path(),
        "A.swift",
        "// swiftlint:disable file_length\nlet a = 1\nlet s = \"unterminated\n",
    );

    let violations = lint(&resolve(dir.path()), None);
    assert!(of_rule(&violations, "file_length").is_empty(), "{violations:?}");
}

#[test]
fn disable_without_violation_is_superfluous() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Main.swift",
        "let a = 1 // swiftlint:disable:this force_try\nlet b = 2 // swiftlint:disable:this not_a_rule\n",
    );

    let violations = lint(&resolve(dir.path()), None);
    let superfluous = of_rule(&violations, "superfluous_disable_command");
    let reasons: Vec<&str> = superfluous.iter().map(|v| v.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "SwiftLint rule 'force_try' did not trigger a violation in the disabled region; remove the disable command",
            "'not_a_rule' is not a valid SwiftLint rule; remove it from the disable command",
        ]
    );
}

#[test]
fn custom_rules_are_addressable_by_their_identifier() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        DEFAULT_FILE_NAME,
        r#"
custom_rules:
  no_print:
    regex: "print\\("
    message: "Use the logger"
    severity: error
"#,
    );
    write(
        dir.path(),
        "Main.swift",
        "print(1) // swiftlint:disable:this no_print\nprint(2)\n",
    );

    let violations = lint(&resolve(dir.path()), None);
    let custom = of_rule(&violations, "no_print");
    assert_eq!(lines(&custom), vec![Some(2)]);
    assert_eq!(custom[0].reason, "Use the logger");
}

// ── Configuration ──

#[test]
fn nested_configuration_applies_to_its_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "App/Main.swift", "let a = try! load()\n");
    write(root, "Legacy/Old.swift", "let a = try! load()\n");
    write(root, "Legacy/.swiftlint.yml", "disabled_rules: [force_try]\n");

    let configuration = resolve(root);
    let storage = RuleStorage::new();
    let mut flagged = Vec::new();
    for path in configuration.lintable_files(&[], false, false) {
        let file_configuration = configuration.configuration_for_file(&path);
        let file = SourceFile::read(&path).unwrap();
        let linter = Linter::new(file, &file_configuration, None, Vec::new()).collect(&storage);
        if !of_rule(&linter.style_violations(), "force_try").is_empty() {
            flagged.push(path.strip_prefix(root).unwrap().to_path_buf());
        }
    }
    assert_eq!(flagged, vec![PathBuf::from("App/Main.swift")]);
}

#[test]
fn excluded_paths_are_not_linted() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, DEFAULT_FILE_NAME, "excluded:\n  - Generated\n");
    write(root, "Main.swift", "let a = 1\n");
    write(root, "Generated/Api.swift", "let b = 2\n");
    write(root, "README.md", "# readme\n");

    let files = resolve(root).lintable_files(&[], false, false);
    assert_eq!(files, vec![root.join("Main.swift")]);
}

#[test]
fn configuring_a_rule_twice_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), DEFAULT_FILE_NAME, "line_length: 100\nline_length: 120\n");
    let result = ConfigurationResolver::new(Arc::new(builtin_catalog()), Arc::new(LintSession::new()))
        .resolve(&ResolveOptions::new(dir.path()));
    assert!(matches!(result, Err(Issue::DuplicatedConfigurations { .. })));
}

#[test]
fn opt_in_rules_run_only_when_enabled() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Main.swift", "if items.count == 0 {}\n");

    let violations = lint(&resolve(dir.path()), None);
    assert!(of_rule(&violations, "empty_count").is_empty());

    write(dir.path(), DEFAULT_FILE_NAME, "opt_in_rules: [empty_count]\n");
    let violations = lint(&resolve(dir.path()), None);
    assert_eq!(lines(&of_rule(&violations, "empty_count")), vec![Some(1)]);
}

#[test]
fn only_rule_option_narrows_the_rules() {
    let dir = TempDir::new().unwrap();
    let mut options = ResolveOptions::new(dir.path());
    options.only_rule = vec!["todo".to_string()];
    let configuration = resolve_with(options);
    assert_eq!(configuration.rule_identifiers(), vec!["todo"]);
}

// ── Collecting rules ──

#[test]
fn collecting_rule_sees_every_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), DEFAULT_FILE_NAME, "only_rules: [type_name_collision]\n");
    write(dir.path(), "A.swift", "struct Model {}\n");
    write(dir.path(), "B.swift", "class Model {}\nstruct Other {}\n");

    let violations = lint(&resolve(dir.path()), None);
    let mut files: Vec<PathBuf> = violations
        .iter()
        .filter_map(|v| v.location.file.clone())
        .collect();
    files.sort();
    assert_eq!(files, vec![dir.path().join("A.swift"), dir.path().join("B.swift")]);
}

// ── Cache ──

#[test]
fn cache_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Main.swift", "let a = try! load()\n");
    let configuration = resolve(dir.path());

    let cache = LinterCache::load(cache_dir.path(), dir.path());
    let first = lint(&configuration, Some(&cache));
    cache.save().unwrap();

    let reloaded = LinterCache::load(cache_dir.path(), dir.path());
    let cached = reloaded.violations(
        &path,
        &LinterCache::content_fingerprint(&fs::read_to_string(&path).unwrap()),
        &configuration.fingerprint(),
    );
    assert_eq!(cached, Some(first.clone()));
    assert_eq!(lint(&configuration, Some(&reloaded)), first);
}

// ── Baseline ──

#[test]
fn baseline_survives_shifted_lines() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, DEFAULT_FILE_NAME, "only_rules: [force_try]\n");
    write(root, "Main.swift", "let a = try! load()\n");
    let configuration = resolve(root);

    let baseline = Baseline::new(&lint(&configuration, None), root);
    let baseline_path = root.join("baseline.json");
    baseline.write(&baseline_path).unwrap();
    let baseline = Baseline::read(&baseline_path, root).unwrap();

    write(root, "Main.swift", "import Foundation\n\nlet a = try! load()\nlet b = try! other()\n");
    let remaining = baseline.filter(&lint(&configuration, None));
    assert_eq!(lines(&remaining.iter().collect::<Vec<_>>()), vec![Some(4)]);
}

// ── Correction ──

#[test]
fn fix_rewrites_correctable_violations() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), DEFAULT_FILE_NAME, "only_rules: [trailing_whitespace]\n");
    let path = write(dir.path(), "Main.swift", "let a = 1   \nlet b = 2\t\n");
    let configuration = resolve(dir.path());

    let storage = RuleStorage::new();
    let file = SourceFile::read(&path).unwrap();
    let corrections = Linter::new(file, &configuration, None, Vec::new())
        .collect(&storage)
        .correct()
        .unwrap();

    assert_eq!(corrections.len(), 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "let a = 1\nlet b = 2\n");
    assert!(lint(&configuration, None).is_empty());
}

#[test]
fn analyzer_rules_need_compiler_arguments() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), DEFAULT_FILE_NAME, "analyzer_rules: [unused_import]\n");
    let path = write(dir.path(), "Main.swift", "import Foundation\nimport Foundation\n");
    let configuration = resolve(dir.path());

    assert!(of_rule(&lint(&configuration, None), "unused_import").is_empty());

    let storage = RuleStorage::new();
    let arguments = vec!["-module-name".to_string(), "App".to_string()];
    let linter = Linter::new(SourceFile::read(&path).unwrap(), &configuration, None, arguments)
        .collect(&storage);
    assert_eq!(lines(&of_rule(&linter.style_violations(), "unused_import")), vec![Some(2)]);
}
