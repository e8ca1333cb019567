//! Turning configuration files into a [`Configuration`].
//!
//! Resolution order:
//!
//! 1. Files passed explicitly, chained as parent and child in order
//! 2. `{root}/.swiftlint.yml`
//! 3. No file found → default configuration
//!
//! Explicitly requested files must resolve. The implicit file may be
//! missing or broken, in which case the default configuration is used with a
//! warning. Duplicated rule configurations and version mismatches are fatal
//! either way.

use super::{Configuration, FileGraph, RemoteFetcher, ResolutionContext};
use crate::catalog::RuleCatalog;
use crate::issue::Issue;
use crate::session::LintSession;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the configuration file looked up in the root directory.
pub const DEFAULT_FILE_NAME: &str = ".swiftlint.yml";

/// Inputs of [`ConfigurationResolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Explicitly requested files, relative to `root_directory`.
    pub config_files: Vec<PathBuf>,
    /// Directory the configuration applies to.
    pub root_directory: PathBuf,
    /// Run every rule regardless of the configuration.
    pub enable_all_rules: bool,
    /// Run only these rules regardless of the configuration.
    pub only_rule: Vec<String>,
    /// Do not follow `parent_config` and `child_config`.
    pub ignore_parent_and_child_configs: bool,
}

impl ResolveOptions {
    /// Options for the implicit file of `root_directory`.
    #[must_use]
    pub fn new(root_directory: &Path) -> Self {
        Self {
            root_directory: root_directory.to_path_buf(),
            ..Self::default()
        }
    }

    fn memo_key(&self) -> String {
        let files: Vec<String> = self
            .config_files
            .iter()
            .map(|f| f.display().to_string())
            .collect();
        format!(
            "{} - {} - {} - {} - {}",
            self.root_directory.display(),
            files.join(","),
            self.enable_all_rules,
            self.only_rule.join(","),
            self.ignore_parent_and_child_configs
        )
    }
}

/// Resolves and memoizes configurations.
pub struct ConfigurationResolver {
    catalog: Arc<RuleCatalog>,
    session: Arc<LintSession>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    memo: Mutex<HashMap<String, Configuration>>,
}

impl std::fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("rules", &self.catalog.len())
            .field("has_fetcher", &self.fetcher.is_some())
            .finish_non_exhaustive()
    }
}

impl ConfigurationResolver {
    /// Resolver without remote configuration support.
    #[must_use]
    pub fn new(catalog: Arc<RuleCatalog>, session: Arc<LintSession>) -> Self {
        Self {
            catalog,
            session,
            fetcher: None,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Enables remote `parent_config` and `child_config` references.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Resolves the configuration described by `options`.
    ///
    /// Results are memoized, so resolving the same options twice returns an
    /// equal configuration without touching the file system again.
    ///
    /// # Errors
    ///
    /// Returns an [`Issue`] if an explicitly requested file cannot be
    /// resolved, or if any document configures a rule twice or requires
    /// another version of this tool.
    pub fn resolve(&self, options: &ResolveOptions) -> Result<Configuration, Issue> {
        let key = options.memo_key();
        if let Some(cached) = self.memo.lock().get(&key) {
            debug!("Using memoized configuration for {}", key);
            return Ok(cached.clone());
        }

        let context = Arc::new(ResolutionContext {
            catalog: self.catalog.clone(),
            session: self.session.clone(),
            fetcher: self.fetcher.clone(),
            enable_all_rules: options.enable_all_rules,
            only_rule: options.only_rule.clone(),
        });
        let custom_files = !options.config_files.is_empty();
        let files = if custom_files {
            options.config_files.clone()
        } else {
            vec![PathBuf::from(DEFAULT_FILE_NAME)]
        };

        let configuration = match self.resolve_files(options, &files, custom_files, &context) {
            Ok(configuration) => configuration,
            Err(issue) if custom_files || issue.is_always_fatal() => return Err(issue),
            Err(issue) => {
                if !issue.is_initial_file_not_found() {
                    warn!("{issue} – Falling back to default configuration");
                }
                Configuration::default_configuration(&options.root_directory, &context)?
            }
        };

        self.memo.lock().insert(key, configuration.clone());
        Ok(configuration)
    }

    fn resolve_files(
        &self,
        options: &ResolveOptions,
        files: &[PathBuf],
        custom_files: bool,
        context: &Arc<ResolutionContext>,
    ) -> Result<Configuration, Issue> {
        let root = &options.root_directory;
        let graph = FileGraph::build(
            root,
            files,
            self.fetcher.as_deref(),
            options.ignore_parent_and_child_configs,
        )?;

        let mut merged: Option<Configuration> = None;
        for vertex in graph.vertices_in_merge_order()? {
            let configuration =
                Configuration::from_document(&vertex.document, &vertex.root_directory, context)?;
            merged = Some(match merged {
                None => configuration,
                Some(parent) => parent.merged(&configuration, root),
            });
        }

        let configuration = match merged {
            Some(configuration) => configuration.with_root_directory(root),
            None => Configuration::default_configuration(root, context)?,
        };
        Ok(configuration.with_graph(&graph, custom_files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver() -> ConfigurationResolver {
        ConfigurationResolver::new(Arc::new(RuleCatalog::new()), Arc::new(LintSession::new()))
    }

    #[test]
    fn test_missing_implicit_file_uses_default() {
        let dir = TempDir::new().unwrap();
        let configuration = resolver().resolve(&ResolveOptions::new(dir.path())).unwrap();
        assert_eq!(
            configuration.rule_identifiers(),
            vec!["invalid_swiftlint_command", "superfluous_disable_command"]
        );
        assert_eq!(configuration.root_directory(), dir.path());
    }

    #[test]
    fn test_broken_implicit_file_falls_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_FILE_NAME), "only_rules: [a]\nopt_in_rules: [b]\n").unwrap();
        let configuration = resolver().resolve(&ResolveOptions::new(dir.path())).unwrap();
        assert_eq!(configuration.rule_identifiers().len(), 2);
    }

    #[test]
    fn test_missing_custom_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut options = ResolveOptions::new(dir.path());
        options.config_files = vec!["missing.yml".into()];
        assert!(matches!(
            resolver().resolve(&options),
            Err(Issue::InitialFileNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicated_configuration_is_always_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_FILE_NAME),
            "superfluous_disable_command: error\nsuperfluous_disable_command: warning\n",
        )
        .unwrap();
        assert!(matches!(
            resolver().resolve(&ResolveOptions::new(dir.path())),
            Err(Issue::DuplicatedConfigurations { .. })
        ));
    }

    #[test]
    fn test_parent_and_child_are_merged() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("base.yml"), "strict: true\nwarning_threshold: 2\n").unwrap();
        fs::write(
            root.join(DEFAULT_FILE_NAME),
            "parent_config: base.yml\nchild_config: child.yml\nwarning_threshold: 4\n",
        )
        .unwrap();
        fs::write(root.join("child.yml"), "disabled_rules: [superfluous_disable_command]\n").unwrap();

        let configuration = resolver().resolve(&ResolveOptions::new(root)).unwrap();
        assert!(configuration.strict());
        assert_eq!(configuration.warning_threshold(), Some(4));
        assert_eq!(configuration.rule_identifiers(), vec!["invalid_swiftlint_command"]);

        let mut options = ResolveOptions::new(root);
        options.ignore_parent_and_child_configs = true;
        let configuration = resolver().resolve(&options).unwrap();
        assert!(!configuration.strict());
        assert_eq!(configuration.rule_identifiers().len(), 2);
    }

    #[test]
    fn test_resolution_is_memoized() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_FILE_NAME), "strict: true\n").unwrap();
        let resolver = resolver();
        let first = resolver.resolve(&ResolveOptions::new(dir.path())).unwrap();
        fs::write(dir.path().join(DEFAULT_FILE_NAME), "strict: false\n").unwrap();
        let second = resolver.resolve(&ResolveOptions::new(dir.path())).unwrap();
        assert_eq!(first, second);
        assert!(second.strict());
    }

    #[test]
    fn test_enable_all_rules_overrides_configuration() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_FILE_NAME),
            "disabled_rules: [superfluous_disable_command]\n",
        )
        .unwrap();
        let mut options = ResolveOptions::new(dir.path());
        options.enable_all_rules = true;
        let configuration = resolver().resolve(&options).unwrap();
        assert_eq!(configuration.rule_identifiers().len(), 2);
    }
}
