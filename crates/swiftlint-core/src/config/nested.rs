//! Configurations found in subdirectories of the root.

use super::{Configuration, Document, DEFAULT_FILE_NAME};
use crate::issue::Issue;
use std::path::Path;
use tracing::debug;

impl Configuration {
    /// The configuration that applies to `file`.
    ///
    /// Every `.swiftlint.yml` between the root directory and the file's
    /// directory is merged on top of this configuration, nearest last.
    /// Their `parent_config` and `child_config` entries are ignored. Files
    /// already part of the configuration graph are skipped, as is the whole
    /// lookup when the configuration came from explicitly requested files.
    #[must_use]
    pub fn configuration_for_file(&self, file: &Path) -> Configuration {
        if self.based_on_custom_configuration_files {
            return self.clone();
        }
        match file.parent() {
            Some(directory) => self.configuration_for_directory(directory),
            None => self.clone(),
        }
    }

    fn configuration_for_directory(&self, directory: &Path) -> Configuration {
        if directory == self.root_directory || !directory.starts_with(&self.root_directory) {
            return self.clone();
        }
        if let Some(cached) = self.nested.lock().get(directory) {
            return cached.clone();
        }

        let parent = match directory.parent() {
            Some(parent) => self.configuration_for_directory(parent),
            None => self.clone(),
        };

        let candidate = directory.join(DEFAULT_FILE_NAME);
        let resolved = if candidate.is_file() && !self.graph_files.contains(&candidate) {
            match self.nested_document(&candidate, directory) {
                Ok(child) => {
                    debug!("Merging nested configuration {}", candidate.display());
                    parent.merged(&child, directory)
                }
                Err(issue) => {
                    issue.print();
                    parent
                }
            }
        } else {
            parent
        };

        self.nested
            .lock()
            .insert(directory.to_path_buf(), resolved.clone());
        resolved
    }

    fn nested_document(&self, path: &Path, directory: &Path) -> Result<Configuration, Issue> {
        let document = Document::read(path)?;
        Configuration::from_document(&document, directory, &self.context)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::RuleCatalog;
    use crate::config::{ConfigurationResolver, ResolveOptions};
    use crate::session::LintSession;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver() -> ConfigurationResolver {
        ConfigurationResolver::new(Arc::new(RuleCatalog::new()), Arc::new(LintSession::new()))
    }

    #[test]
    fn test_nested_configuration_is_merged() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join(".swiftlint.yml"), "warning_threshold: 5\n").unwrap();
        fs::create_dir_all(root.join("Module/Sub")).unwrap();
        fs::write(
            root.join("Module/.swiftlint.yml"),
            "disabled_rules: [invalid_swiftlint_command]\nstrict: true\n",
        )
        .unwrap();

        let configuration = resolver()
            .resolve(&ResolveOptions::new(root))
            .unwrap();
        assert!(configuration.rule("invalid_swiftlint_command").is_some());

        let nested = configuration.configuration_for_file(&root.join("Module/Sub/File.swift"));
        assert!(nested.rule("invalid_swiftlint_command").is_none());
        assert!(nested.strict());
        assert_eq!(nested.warning_threshold(), Some(5));
        assert_eq!(nested.root_directory(), root.join("Module"));

        let top = configuration.configuration_for_file(&root.join("File.swift"));
        assert_eq!(top, configuration);
    }

    #[test]
    fn test_custom_configuration_files_skip_nesting() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("custom.yml"), "").unwrap();
        fs::create_dir_all(root.join("Module")).unwrap();
        fs::write(root.join("Module/.swiftlint.yml"), "strict: true\n").unwrap();

        let mut options = ResolveOptions::new(root);
        options.config_files = vec!["custom.yml".into()];
        let configuration = resolver().resolve(&options).unwrap();
        let nested = configuration.configuration_for_file(&root.join("Module/File.swift"));
        assert!(!nested.strict());
    }
}
