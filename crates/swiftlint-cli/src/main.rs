//! SwiftLint CLI tool.
//!
//! Usage:
//! ```bash
//! swiftlint lint [OPTIONS] [PATHS]...
//! swiftlint analyze --compiler-log-path build.log [PATHS]...
//! swiftlint rules [RULE]
//! swiftlint baseline compare --baseline old.json --other-baseline new.json
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod remote;

/// A tool to enforce Swift style and conventions
#[derive(Parser)]
#[command(name = "swiftlint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print lint warnings and errors
    Lint(LintArgs),

    /// Run analyzer rules, which need the compiler arguments of each file
    Analyze(AnalyzeArgs),

    /// Display the list of rules and their identifiers
    Rules(RulesArgs),

    /// Operations on existing baselines
    Baseline {
        #[command(subcommand)]
        command: BaselineCommand,
    },
}

/// Options shared by `lint` and `analyze`.
#[derive(Args, Debug, Clone, Default)]
pub struct LintArgs {
    /// Files or directories to lint (default: the configured `included` paths)
    pub paths: Vec<PathBuf>,

    /// Configuration files, merged as parent and child in the given order
    #[arg(long = "config")]
    pub config: Vec<PathBuf>,

    /// Correct violations where possible instead of reporting them
    #[arg(long, alias = "autocorrect")]
    pub fix: bool,

    /// Upgrade warnings to errors
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,

    /// Downgrade errors to warnings
    #[arg(long)]
    pub lenient: bool,

    /// Only print the report, no status messages
    #[arg(long)]
    pub quiet: bool,

    /// Reporter used to print violations
    #[arg(long)]
    pub reporter: Option<String>,

    /// Baseline whose violations are not reported
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Write every violation found to this baseline
    #[arg(long)]
    pub write_baseline: Option<PathBuf>,

    /// Directory to run in
    #[arg(long)]
    pub working_directory: Option<PathBuf>,

    /// Exclude files in excluded paths even when they are named explicitly
    #[arg(long)]
    pub force_exclude: bool,

    /// Match excluded paths as prefixes instead of glob patterns
    #[arg(long)]
    pub use_alternative_excluding: bool,

    /// Do not read or write the violation cache
    #[arg(long)]
    pub no_cache: bool,

    /// Directory of the violation cache
    #[arg(long, env = "SWIFTLINT_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    /// Print the slowest rules and files
    #[arg(long)]
    pub benchmark: bool,

    /// Run every rule, ignoring the configured rule lists
    #[arg(long)]
    pub enable_all_rules: bool,

    /// Run only this rule, ignoring the configured rule lists (repeatable)
    #[arg(long)]
    pub only_rule: Vec<String>,

    /// Ignore `parent_config` and `child_config` entries
    #[arg(long)]
    pub no_parent_and_child_configs: bool,
}

/// Options of `analyze`.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub lint: LintArgs,

    /// Build log holding the compiler invocations
    #[arg(long, conflicts_with = "compile_commands")]
    pub compiler_log_path: Option<PathBuf>,

    /// `compile_commands.json` holding the compiler invocations
    #[arg(long)]
    pub compile_commands: Option<PathBuf>,
}

/// Options of `rules`.
#[derive(Args, Debug, Clone, Default)]
pub struct RulesArgs {
    /// Print the description and configuration of this rule only
    pub rule_identifier: Option<String>,

    /// Only list rules enabled by the configuration
    #[arg(long, conflicts_with = "disabled")]
    pub enabled: bool,

    /// Only list rules not enabled by the configuration
    #[arg(long)]
    pub disabled: bool,

    /// Configuration files to evaluate
    #[arg(long = "config")]
    pub config: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum BaselineCommand {
    /// Report the violations of one baseline that another does not contain
    Compare {
        /// The reference baseline
        #[arg(long)]
        baseline: PathBuf,

        /// The baseline to check for new violations
        #[arg(long)]
        other_baseline: PathBuf,

        /// Reporter used to print the new violations
        #[arg(long)]
        reporter: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Lint(args) => commands::lint::run(&args, None),
        Commands::Analyze(args) => {
            let arguments = commands::analyze::compiler_arguments(&args)?;
            commands::lint::run(&args.lint, Some(&arguments))
        }
        Commands::Rules(args) => commands::rules::run(&args),
        Commands::Baseline { command } => match command {
            BaselineCommand::Compare {
                baseline,
                other_baseline,
                reporter,
            } => commands::baseline::compare(&baseline, &other_baseline, reporter.as_deref()),
        },
    }
}
