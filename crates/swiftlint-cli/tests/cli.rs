//! Integration test: the `swiftlint` binary end to end.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn swiftlint(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_swiftlint"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CACHE_HOME", dir.join(".cache"))
        .env_remove("RUST_LOG")
        .output()
        .expect("swiftlint should run")
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".swiftlint.yml"), "only_rules: [force_try, todo]\n").unwrap();
    fs::write(dir.path().join("Main.swift"), "let a = try! load()\n// TODO: tidy up\n").unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn lint_reports_and_fails_on_errors() {
    let dir = project();
    let output = swiftlint(dir.path(), &["lint", "--quiet"]);
    let report = stdout(&output);

    assert_eq!(output.status.code(), Some(2), "{report}");
    assert!(report.contains("Main.swift:1:9: error: Force Try Violation"), "{report}");
    assert!(report.contains("(todo)"), "{report}");
}

#[test]
fn lenient_turns_errors_into_warnings() {
    let dir = project();
    let output = swiftlint(dir.path(), &["lint", "--quiet", "--lenient", "--reporter", "json"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!stdout(&output).contains("\"Error\""));
}

#[test]
fn written_baseline_silences_known_violations() {
    let dir = project();
    let first = swiftlint(
        dir.path(),
        &["lint", "--quiet", "--baseline", "baseline.json", "--write-baseline", "baseline.json"],
    );
    assert_eq!(first.status.code(), Some(2));
    assert!(dir.path().join("baseline.json").exists());

    let second = swiftlint(dir.path(), &["lint", "--quiet", "--baseline", "baseline.json"]);
    assert_eq!(second.status.code(), Some(0));
    assert_eq!(stdout(&second), "");
}

#[test]
fn duplicated_rule_configuration_is_fatal() {
    let dir = project();
    fs::write(dir.path().join(".swiftlint.yml"), "todo: error\ntodo: warning\n").unwrap();
    let output = swiftlint(dir.path(), &["lint", "--quiet"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn rules_lists_every_rule() {
    let dir = project();
    let output = swiftlint(dir.path(), &["rules"]);
    let table = stdout(&output);
    assert_eq!(output.status.code(), Some(0));
    for identifier in ["force_try", "superfluous_disable_command", "unused_import"] {
        assert!(table.contains(identifier), "{table}");
    }
}

#[test]
fn fix_corrects_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".swiftlint.yml"), "only_rules: [trailing_whitespace]\n").unwrap();
    fs::write(dir.path().join("Main.swift"), "let a = 1  \n").unwrap();

    let output = swiftlint(dir.path(), &["lint", "--fix", "--quiet"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(dir.path().join("Main.swift")).unwrap(), "let a = 1\n");
}
