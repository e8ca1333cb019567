//! Persistent violation cache.
//!
//! Each lintable file maps to the violations found the last time it was
//! linted, together with the fingerprints of its contents and of the
//! configuration it was linted under. An entry is only reused when both
//! fingerprints still match.
//!
//! Reads may happen concurrently from any number of files. Writes go to a
//! separate map behind a lock and reach the disk once, through
//! [`LinterCache::save`].

use crate::types::StyleViolation;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the cache file inside its directory.
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Errors from loading or saving the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file exists but could not be read.
    #[error("failed to read cache at {}: {source}", .path.display())]
    Read {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not valid JSON for this version.
    #[error("failed to parse cache at {}: {source}", .path.display())]
    Parse {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The cache could not be written.
    #[error("failed to write cache at {}: {source}", .path.display())]
    Write {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The cache could not be serialized.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Cached result of linting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Digest of the file contents.
    pub content_fingerprint: String,
    /// Digest of the configuration the file was linted under.
    pub configuration_fingerprint: String,
    /// Violations found.
    pub violations: Vec<StyleViolation>,
}

type Entries = BTreeMap<PathBuf, CacheEntry>;

/// Violations of previous runs, keyed by absolute file path.
#[derive(Debug, Default)]
pub struct LinterCache {
    location: Option<PathBuf>,
    read: Entries,
    write: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl LinterCache {
    /// An in-memory cache that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache file used for `root_directory` under `cache_path`.
    ///
    /// Every root directory gets its own subdirectory so that projects do
    /// not evict each other.
    #[must_use]
    pub fn file_for(cache_path: &Path, root_directory: &Path) -> PathBuf {
        let digest = blake3::hash(root_directory.to_string_lossy().as_bytes()).to_hex();
        cache_path.join(&digest[..16]).join(CACHE_FILE_NAME)
    }

    /// Loads the cache of `root_directory`.
    ///
    /// A missing file yields an empty cache. A corrupt one is reported and
    /// ignored, to be overwritten on [`save`](Self::save).
    #[must_use]
    pub fn load(cache_path: &Path, root_directory: &Path) -> Self {
        let location = Self::file_for(cache_path, root_directory);
        let read = match Self::read_entries(&location) {
            Ok(entries) => entries,
            Err(CacheError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Entries::new()
            }
            Err(error) => {
                warn!("{error}; ignoring the cache");
                Entries::new()
            }
        };
        debug!("Loaded {} cache entries from {}", read.len(), location.display());
        Self {
            location: Some(location),
            read,
            write: RwLock::new(HashMap::new()),
        }
    }

    fn read_entries(path: &Path) -> Result<Entries, CacheError> {
        let text = std::fs::read_to_string(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CacheError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Digest used as content fingerprint.
    #[must_use]
    pub fn content_fingerprint(contents: &str) -> String {
        blake3::hash(contents.as_bytes()).to_hex().to_string()
    }

    /// Cached violations of `file`, if both fingerprints match.
    #[must_use]
    pub fn violations(
        &self,
        file: &Path,
        content_fingerprint: &str,
        configuration_fingerprint: &str,
    ) -> Option<Vec<StyleViolation>> {
        let matches = |entry: &CacheEntry| {
            entry.content_fingerprint == content_fingerprint
                && entry.configuration_fingerprint == configuration_fingerprint
        };
        if let Some(entry) = self.write.read().get(file) {
            return matches(entry).then(|| entry.violations.clone());
        }
        self.read
            .get(file)
            .filter(|entry| matches(entry))
            .map(|entry| entry.violations.clone())
    }

    /// Records the violations of `file`.
    pub fn cache(
        &self,
        file: &Path,
        content_fingerprint: &str,
        configuration_fingerprint: &str,
        violations: &[StyleViolation],
    ) {
        self.write.write().insert(
            file.to_path_buf(),
            CacheEntry {
                content_fingerprint: content_fingerprint.to_string(),
                configuration_fingerprint: configuration_fingerprint.to_string(),
                violations: violations.to_vec(),
            },
        );
    }

    /// Number of entries, old and new.
    #[must_use]
    pub fn len(&self) -> usize {
        let write = self.write.read();
        self.read.keys().filter(|k| !write.contains_key(*k)).count() + write.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes old and new entries to disk. A no-op for in-memory caches and
    /// when nothing was linted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file cannot be serialized or written.
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(location) = &self.location else {
            return Ok(());
        };
        let write = self.write.read();
        if write.is_empty() {
            return Ok(());
        }

        let mut merged = self.read.clone();
        merged.extend(write.iter().map(|(k, v)| (k.clone(), v.clone())));
        let json = serde_json::to_string(&merged)?;

        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(location, json).map_err(|source| CacheError::Write {
            path: location.clone(),
            source,
        })?;
        debug!("Saved {} cache entries to {}", merged.len(), location.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn violation() -> StyleViolation {
        StyleViolation::new(
            "force_try",
            "Force Try",
            Severity::Error,
            Location::new("/project/File.swift", 1, 9),
            "Force tries should be avoided",
        )
    }

    #[test]
    fn test_fingerprints_must_match() {
        let cache = LinterCache::in_memory();
        let file = Path::new("/project/File.swift");
        cache.cache(file, "content", "config", &[violation()]);

        assert_eq!(cache.violations(file, "content", "config"), Some(vec![violation()]));
        assert_eq!(cache.violations(file, "changed", "config"), None);
        assert_eq!(cache.violations(file, "content", "other"), None);
        assert_eq!(cache.violations(Path::new("/other.swift"), "content", "config"), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let root = Path::new("/project");
        let file = Path::new("/project/File.swift");

        let cache = LinterCache::load(dir.path(), root);
        assert!(cache.is_empty());
        cache.cache(file, "content", "config", &[violation()]);
        cache.save().unwrap();

        let reloaded = LinterCache::load(dir.path(), root);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.violations(file, "content", "config"), Some(vec![violation()]));

        let other_root = LinterCache::load(dir.path(), Path::new("/elsewhere"));
        assert!(other_root.is_empty());
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        let root = Path::new("/project");
        let location = LinterCache::file_for(dir.path(), root);
        std::fs::create_dir_all(location.parent().unwrap()).unwrap();
        std::fs::write(&location, "{ not json").unwrap();

        let cache = LinterCache::load(dir.path(), root);
        assert!(cache.is_empty());
        cache.cache(Path::new("/project/A.swift"), "c", "f", &[]);
        cache.save().unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&std::fs::read_to_string(location).unwrap()).is_ok());
    }
}
