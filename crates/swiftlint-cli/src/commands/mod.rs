//! Subcommand implementations.

pub mod analyze;
pub mod baseline;
pub mod lint;
pub mod output;
pub mod rules;
