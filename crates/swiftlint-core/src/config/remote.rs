//! Remote parent and child configurations.
//!
//! Fetching is delegated to a [`RemoteFetcher`] so the library stays free of
//! networking. Every successful fetch is cached on disk and the cached copy
//! is used whenever the network fails.

use crate::issue::Issue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches the text of a remote configuration.
pub trait RemoteFetcher: Send + Sync {
    /// Downloads `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message on failure.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, String>;
}

/// Returns `true` if a reference points to a remote document.
#[must_use]
pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Network timeouts for remote configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTimeouts {
    /// Used when no cached copy exists.
    pub timeout: Duration,
    /// Used when a cached copy can serve as fallback.
    pub timeout_if_cached: Duration,
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            timeout_if_cached: Duration::from_secs(1),
        }
    }
}

const CACHE_HEADER: &str = "#\n# Automatically downloaded from";

/// On-disk copies of remote configurations.
#[derive(Debug, Clone)]
pub struct RemoteCache {
    directory: PathBuf,
}

impl RemoteCache {
    /// Cache living under `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            directory: root.join(".swiftlint").join("RemoteConfigCache").join("v1"),
        }
    }

    /// File holding the copy of `url`.
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = blake3::hash(url.as_bytes()).to_hex();
        self.directory.join(format!("{}.yml", &digest[..16]))
    }

    /// Cached text of `url`, without the header.
    #[must_use]
    pub fn read(&self, url: &str) -> Option<String> {
        let text = std::fs::read_to_string(self.path_for(url)).ok()?;
        let body = if text.starts_with(CACHE_HEADER) {
            text.split_once("\n#\n\n").map_or(text.as_str(), |(_, body)| body)
        } else {
            text.as_str()
        };
        Some(body.to_string())
    }

    /// Stores the text of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::FileNotWritable`] if the cache cannot be written.
    pub fn write(&self, url: &str, contents: &str) -> Result<(), Issue> {
        let path = self.path_for(url);
        std::fs::create_dir_all(&self.directory).map_err(|source| Issue::FileNotWritable {
            path: self.directory.clone(),
            source,
        })?;
        let text = format!(
            "{CACHE_HEADER} {url}\n# Do not edit this file, changes are overwritten on the next download.\n#\n\n{contents}"
        );
        std::fs::write(&path, text).map_err(|source| Issue::FileNotWritable { path, source })
    }
}

/// Loads a remote document, falling back to the cached copy.
///
/// # Errors
///
/// Returns [`Issue::RemoteConfigUnavailable`] if neither the network nor the
/// cache can provide the document.
pub fn load_remote(
    url: &str,
    fetcher: Option<&dyn RemoteFetcher>,
    cache: &RemoteCache,
    timeouts: RemoteTimeouts,
) -> Result<String, Issue> {
    let cached = cache.read(url);
    let timeout = if cached.is_some() {
        timeouts.timeout_if_cached
    } else {
        timeouts.timeout
    };

    let fetched = match fetcher {
        Some(fetcher) => fetcher.fetch(url, timeout),
        None => Err("no remote fetcher available".to_string()),
    };

    match (fetched, cached) {
        (Ok(text), _) => {
            debug!("Fetched remote configuration {}", url);
            if let Err(issue) = cache.write(url, &text) {
                issue.print();
            }
            Ok(text)
        }
        (Err(message), Some(cached)) => {
            warn!("Unable to load remote config from '{url}': {message}. Using cached version.");
            Ok(cached)
        }
        (Err(message), None) => Err(Issue::RemoteConfigUnavailable {
            url: url.to_string(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct StaticFetcher(Result<String, String>);

    impl RemoteFetcher for StaticFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, String> {
            self.0.clone()
        }
    }

    const URL: &str = "https://example.com/.swiftlint.yml";

    #[test]
    fn test_fetch_populates_cache() {
        let dir = TempDir::new().unwrap();
        let cache = RemoteCache::new(dir.path());
        let fetcher = StaticFetcher(Ok("disabled_rules: [todo]\n".to_string()));
        let text = load_remote(URL, Some(&fetcher), &cache, RemoteTimeouts::default()).unwrap();
        assert_eq!(text, "disabled_rules: [todo]\n");
        assert_eq!(cache.read(URL).as_deref(), Some("disabled_rules: [todo]\n"));
    }

    #[test]
    fn test_cache_is_used_when_offline() {
        let dir = TempDir::new().unwrap();
        let cache = RemoteCache::new(dir.path());
        cache.write(URL, "strict: true\n").unwrap();
        let offline = StaticFetcher(Err("timed out".to_string()));
        let text = load_remote(URL, Some(&offline), &cache, RemoteTimeouts::default()).unwrap();
        assert_eq!(text, "strict: true\n");
    }

    #[test]
    fn test_unavailable_without_cache() {
        let dir = TempDir::new().unwrap();
        let cache = RemoteCache::new(dir.path());
        let result = load_remote(URL, None, &cache, RemoteTimeouts::default());
        assert!(matches!(result, Err(Issue::RemoteConfigUnavailable { .. })));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.yml"));
        assert!(!is_remote("../parent.yml"));
    }
}
