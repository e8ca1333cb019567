//! Downloads remote `parent_config` and `child_config` documents.

use std::time::Duration;
use swiftlint_core::RemoteFetcher;

/// Blocking HTTP fetcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, String> {
        tracing::debug!("Fetching remote configuration {url}");
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("swiftlint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| e.to_string())?;
        let response = client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| e.to_string())?;
        response.text().map_err(|e| e.to_string())
    }
}
