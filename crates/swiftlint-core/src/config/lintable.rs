//! Discovery of the Swift files a configuration applies to.

use super::{normalize, Configuration};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SWIFT_EXTENSION: &str = "swift";

impl Configuration {
    /// Swift files to lint for the given `paths`, sorted.
    ///
    /// Without `paths` the configured `included` paths are used, or the root
    /// directory if there are none. Directories are walked recursively and
    /// files under an `excluded` path are dropped. Files named explicitly are
    /// always kept unless `force_exclude` is set. With `exclude_by_prefix`
    /// excluded entries are compared as plain path prefixes instead of glob
    /// patterns.
    #[must_use]
    pub fn lintable_files(
        &self,
        paths: &[PathBuf],
        force_exclude: bool,
        exclude_by_prefix: bool,
    ) -> Vec<PathBuf> {
        let requested: Vec<PathBuf> = if paths.is_empty() {
            vec![self.root_directory.clone()]
        } else {
            paths
                .iter()
                .map(|p| normalize(&self.root_directory.join(p)))
                .collect()
        };

        let excluded = ExclusionMatcher::new(&self.excluded_paths, exclude_by_prefix);
        let mut files = BTreeSet::new();
        for path in requested {
            if path.is_file() {
                if !force_exclude || !excluded.is_excluded(&path) {
                    files.insert(path);
                }
                continue;
            }
            let roots = if self.included_paths.is_empty() {
                vec![path.clone()]
            } else {
                self.resolved_included_paths()
                    .into_iter()
                    .filter(|included| included.starts_with(&path) || path.starts_with(included))
                    .map(|included| if included.starts_with(&path) { included } else { path.clone() })
                    .collect()
            };
            for root in roots {
                files.extend(
                    swift_files_in(&root)
                        .into_iter()
                        .filter(|f| !excluded.is_excluded(f)),
                );
            }
        }

        debug!("Found {} lintable files", files.len());
        files.into_iter().collect()
    }

    fn resolved_included_paths(&self) -> Vec<PathBuf> {
        self.included_paths
            .iter()
            .flat_map(|included| expand_glob(included))
            .collect()
    }
}

fn is_glob(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '['])
}

fn expand_glob(path: &Path) -> Vec<PathBuf> {
    if !is_glob(path) {
        return vec![path.to_path_buf()];
    }
    match glob::glob(&path.to_string_lossy()) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(error) => {
            warn!("Invalid glob pattern '{}': {error}", path.display());
            Vec::new()
        }
    }
}

fn swift_files_in(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if has_swift_extension(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut builder = ignore::WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                debug!("Skipping unreadable entry: {error}");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && has_swift_extension(path) {
            files.push(path.to_path_buf());
        }
    }
    files
}

fn has_swift_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SWIFT_EXTENSION)
}

/// Decides whether a file falls under an `excluded` entry.
struct ExclusionMatcher {
    prefixes: Vec<PathBuf>,
    patterns: Vec<glob::Pattern>,
}

impl ExclusionMatcher {
    fn new(excluded: &[PathBuf], by_prefix: bool) -> Self {
        let mut prefixes = Vec::new();
        let mut patterns = Vec::new();
        for path in excluded {
            if by_prefix || !is_glob(path) {
                prefixes.push(path.clone());
                continue;
            }
            match glob::Pattern::new(&path.to_string_lossy()) {
                Ok(pattern) => patterns.push(pattern),
                Err(error) => warn!("Invalid glob pattern '{}': {error}", path.display()),
            }
        }
        Self { prefixes, patterns }
    }

    fn is_excluded(&self, file: &Path) -> bool {
        if self.prefixes.iter().any(|p| file.starts_with(p)) {
            return true;
        }
        file.ancestors()
            .any(|candidate| self.patterns.iter().any(|p| p.matches_path(candidate)))
    }
}
