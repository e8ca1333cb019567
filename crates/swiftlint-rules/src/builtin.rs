//! The catalog of every rule shipped with SwiftLint.

use crate::{
    BlanketDisableCommand, CustomRules, EmptyCount, FileLength, ForceCast, ForceTry, LineLength,
    Todo, TrailingWhitespace, TypeNameCollision, UnusedImport,
};
use swiftlint_core::RuleCatalog;

/// Returns a catalog with the engine's meta rules and every built-in rule.
///
/// Opt-in and analyzer rules are registered too. Whether they run is
/// decided by the configuration.
#[must_use]
pub fn builtin_catalog() -> RuleCatalog {
    let catalog = RuleCatalog::new()
        .with::<BlanketDisableCommand>()
        .with::<CustomRules>()
        .with::<EmptyCount>()
        .with::<FileLength>()
        .with::<ForceCast>()
        .with::<ForceTry>()
        .with::<LineLength>()
        .with::<Todo>()
        .with::<TrailingWhitespace>()
        .with::<TypeNameCollision>()
        .with::<UnusedImport>();
    tracing::debug!(rules = catalog.len(), "built-in rule catalog ready");
    catalog
}
