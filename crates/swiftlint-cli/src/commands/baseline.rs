//! `baseline compare` implementation.

use super::output;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use swiftlint_core::{Baseline, DEFAULT_REPORTER};

/// Reports the violations of `other` that `baseline` does not contain.
pub fn compare(baseline: &Path, other: &Path, reporter: Option<&str>) -> Result<ExitCode> {
    let root = std::env::current_dir().context("Could not determine the current directory")?;
    let reporter = output::reporter(reporter.unwrap_or(DEFAULT_REPORTER))?;
    let known = Baseline::read(baseline, &root)
        .with_context(|| format!("Could not read baseline {}", baseline.display()))?;
    let candidate = Baseline::read(other, &root)
        .with_context(|| format!("Could not read baseline {}", other.display()))?;

    let new = known.compare(&candidate);
    tracing::debug!("{} violations not in {}", new.len(), baseline.display());
    output::print_report(reporter.as_ref(), &new);
    Ok(ExitCode::SUCCESS)
}
