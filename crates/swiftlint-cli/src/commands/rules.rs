//! `rules` implementation.

use crate::{config_resolver, RulesArgs};
use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::process::ExitCode;
use std::sync::Arc;
use swiftlint_core::{Capabilities, Configuration, LintSession, ResolveOptions};

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleRow {
    identifier: &'static str,
    opt_in: bool,
    correctable: bool,
    enabled: bool,
    kind: String,
    analyzer: bool,
    configuration: String,
}

/// Runs the rules command.
pub fn run(args: &RulesArgs) -> Result<ExitCode> {
    let root = std::env::current_dir().context("Could not determine the current directory")?;
    let options = ResolveOptions {
        config_files: args.config.clone(),
        ..ResolveOptions::new(&root)
    };
    let configuration = match config_resolver::resolver(Arc::new(LintSession::new())).resolve(&options) {
        Ok(configuration) => configuration,
        Err(issue) => {
            eprintln!("{:?}", miette::Report::new(issue));
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(identifier) = &args.rule_identifier {
        print_rule(&configuration, identifier)?;
        return Ok(ExitCode::SUCCESS);
    }

    let rows: Vec<RuleRow> = rows(&configuration)
        .into_iter()
        .filter(|row| !args.enabled || row.enabled)
        .filter(|row| !args.disabled || !row.enabled)
        .collect();
    print_table(&rows);
    Ok(ExitCode::SUCCESS)
}

fn print_rule(configuration: &Configuration, identifier: &str) -> Result<()> {
    let catalog = configuration.catalog();
    let Some(description) = catalog.description(identifier) else {
        bail!("No rule with identifier: {identifier}");
    };
    println!("{} ({}): {}", description.name, description.identifier, description.description);

    let rule = configuration
        .rules_wrapper()
        .all_rules_wrapped()
        .iter()
        .find(|wrapped| wrapped.identifier() == description.identifier)
        .map(|wrapped| wrapped.rule.clone())
        .or_else(|| catalog.default_rule(description.identifier));
    if let Some(rule) = rule {
        let yaml = rule.configuration_description().yaml();
        if !yaml.is_empty() {
            println!("\nConfiguration (YAML):\n\n{}:", description.identifier);
            for line in yaml.lines() {
                println!("  {line}");
            }
        }
    }
    Ok(())
}

fn rows(configuration: &Configuration) -> Vec<RuleRow> {
    let enabled: BTreeSet<&str> = configuration.rule_identifiers().into_iter().collect();
    let mut rows: Vec<RuleRow> = configuration
        .rules_wrapper()
        .all_rules_wrapped()
        .iter()
        .map(|wrapped| {
            let description = wrapped.rule.description();
            RuleRow {
                identifier: description.identifier,
                opt_in: description.has(Capabilities::OPT_IN),
                correctable: description.has(Capabilities::CORRECTABLE),
                enabled: enabled.contains(description.identifier),
                kind: description.kind.to_string(),
                analyzer: description.has(Capabilities::ANALYZER_ONLY),
                configuration: wrapped.rule.configuration_description().one_line(),
            }
        })
        .collect();
    rows.sort_by_key(|row| row.identifier);
    rows
}

fn print_table(rows: &[RuleRow]) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let width = rows.iter().map(|r| r.identifier.len()).max().unwrap_or(0).max("identifier".len());
    println!(
        "{:<width$}  {:<6}  {:<11}  {:<7}  {:<11}  {:<8}  configuration",
        "identifier", "opt-in", "correctable", "enabled", "kind", "analyzer"
    );
    println!("{}", "-".repeat(width + 60));
    for row in rows {
        println!(
            "{:<width$}  {:<6}  {:<11}  {:<7}  {:<11}  {:<8}  {}",
            row.identifier,
            yes_no(row.opt_in),
            yes_no(row.correctable),
            yes_no(row.enabled),
            row.kind,
            yes_no(row.analyzer),
            row.configuration
        );
    }
}
