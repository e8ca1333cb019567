//! Compiler arguments for `analyze`.
//!
//! Two sources are understood: a build log with one `swiftc` invocation per
//! line, and a `compile_commands.json` compilation database.

use crate::AnalyzeArgs;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Compiler arguments per absolute Swift file path.
pub type CompilerArguments = HashMap<PathBuf, Vec<String>>;

/// Flags that only affect build outputs, dropped with their value if they
/// take one.
const IGNORED_FLAGS: &[(&str, bool)] = &[
    ("-parseable-output", false),
    ("-incremental", false),
    ("-serialize-diagnostics", false),
    ("-emit-dependencies", false),
    ("-use-frontend-parseable-output", false),
    ("-output-file-map", true),
];

#[derive(Debug, Deserialize)]
struct CompileCommand {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    command: Option<String>,
}

/// Reads the compiler arguments named by `args`.
pub fn compiler_arguments(args: &AnalyzeArgs) -> Result<CompilerArguments> {
    if let Some(path) = &args.compiler_log_path {
        let log = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read compiler log at {}", path.display()))?;
        return Ok(from_compiler_log(&log));
    }
    if let Some(path) = &args.compile_commands {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read compilation database at {}", path.display()))?;
        return from_compile_commands(&text)
            .with_context(|| format!("Could not parse compilation database at {}", path.display()));
    }
    bail!("Could not read compiler arguments: pass --compiler-log-path or --compile-commands")
}

/// Arguments of every `swiftc` invocation in a build log, for each Swift
/// file the invocation compiles.
#[must_use]
pub fn from_compiler_log(log: &str) -> CompilerArguments {
    let mut arguments = CompilerArguments::new();
    for line in log.lines() {
        let mut words = line.split_whitespace();
        let Some(executable) = words.next() else {
            continue;
        };
        if !executable.ends_with("swiftc") {
            continue;
        }
        let invocation = filter_arguments(words);
        for file in invocation.iter().filter(|a| is_swift_file(a)) {
            arguments.insert(PathBuf::from(file), invocation.clone());
        }
    }
    tracing::debug!("Found compiler arguments for {} files", arguments.len());
    arguments
}

/// Arguments of every entry of a compilation database.
///
/// # Errors
///
/// Returns an error if `text` is not a compilation database.
pub fn from_compile_commands(text: &str) -> Result<CompilerArguments> {
    let commands: Vec<CompileCommand> = serde_json::from_str(text)?;
    let mut arguments = CompilerArguments::new();
    for command in commands {
        let words: Vec<String> = if command.arguments.is_empty() {
            command
                .command
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect()
        } else {
            command.arguments
        };
        let file = absolute(&command.directory, &command.file);
        arguments.insert(file, filter_arguments(words.iter().skip(1).map(String::as_str)));
    }
    Ok(arguments)
}

fn filter_arguments<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut filtered = Vec::new();
    let mut skip_value = false;
    for word in words {
        if std::mem::take(&mut skip_value) {
            continue;
        }
        if let Some((_, takes_value)) = IGNORED_FLAGS.iter().find(|(flag, _)| *flag == word) {
            skip_value = *takes_value;
            continue;
        }
        filtered.push(word.to_string());
    }
    filtered
}

fn is_swift_file(argument: &str) -> bool {
    Path::new(argument).extension().and_then(|e| e.to_str()) == Some("swift")
}

fn absolute(directory: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        directory.join(file)
    }
}
