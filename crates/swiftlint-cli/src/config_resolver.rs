//! Turning command line options into a resolved configuration and the
//! locations derived from it.
//!
//! The violation cache directory is picked in this order:
//!
//! 1. `--cache-path` flag (or `$SWIFTLINT_CACHE_PATH`)
//! 2. `cache_path` from the configuration, relative to its root
//! 3. `$XDG_CACHE_HOME/swiftlint` or `~/.cache/swiftlint`
//! 4. Nowhere → the cache is kept in memory only

use crate::remote::HttpFetcher;
use crate::LintArgs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swiftlint_core::{Configuration, ConfigurationResolver, LintSession, ResolveOptions};
use swiftlint_rules::builtin_catalog;

/// Where the violation cache lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Taken from the configuration.
    Configured(PathBuf),
    /// The per-user cache directory.
    User(PathBuf),
    /// No directory; violations are cached for this run only.
    InMemory,
}

impl CacheLocation {
    /// Returns the directory, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Configured(p) | Self::User(p) => Some(p),
            Self::InMemory => None,
        }
    }
}

/// Resolver with the built-in rules and remote configuration support.
#[must_use]
pub fn resolver(session: Arc<LintSession>) -> ConfigurationResolver {
    ConfigurationResolver::new(Arc::new(builtin_catalog()), session).with_fetcher(Arc::new(HttpFetcher))
}

/// Resolution inputs for a `lint` or `analyze` run rooted at `root`.
#[must_use]
pub fn resolve_options(root: &Path, args: &LintArgs) -> ResolveOptions {
    ResolveOptions {
        config_files: args.config.clone(),
        root_directory: root.to_path_buf(),
        enable_all_rules: args.enable_all_rules,
        only_rule: args.only_rule.clone(),
        ignore_parent_and_child_configs: args.no_parent_and_child_configs,
    }
}

/// Picks the cache directory. See module-level docs for the order.
#[must_use]
pub fn cache_location(explicit: Option<&Path>, configuration: &Configuration) -> CacheLocation {
    cache_location_inner(
        explicit,
        configuration.cache_path(),
        configuration.root_directory(),
        user_cache_dir(),
    )
}

/// Testable core: accepts `user_dir` as parameter to avoid env var races.
fn cache_location_inner(
    explicit: Option<&Path>,
    configured: Option<&Path>,
    root: &Path,
    user_dir: Option<PathBuf>,
) -> CacheLocation {
    if let Some(p) = explicit {
        return CacheLocation::Explicit(p.to_path_buf());
    }
    if let Some(p) = configured {
        return CacheLocation::Configured(root.join(p));
    }
    match user_dir {
        Some(dir) => CacheLocation::User(dir),
        None => CacheLocation::InMemory,
    }
}

/// Returns the per-user cache directory.
///
/// Resolution: `$XDG_CACHE_HOME/swiftlint` > `~/.cache/swiftlint`
#[must_use]
pub fn user_cache_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CACHE_HOME").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join("swiftlint"));
    }
    home::home_dir().map(|h| h.join(".cache").join("swiftlint"))
}
