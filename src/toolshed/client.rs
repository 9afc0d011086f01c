// src/toolshed/client.rs

//! HTTP client for the Tool Shed API
//!
//! Wraps reqwest with retry support for the one query reconciliation needs:
//! `get_ordered_installable_revisions`.

use super::InstallabilityOracle;
use crate::error::{Error, Result};
use crate::package::PackageKey;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts for a failed request
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

const INSTALLABLE_REVISIONS_PATH: &str = "api/repositories/get_ordered_installable_revisions";

/// Tool Shed API client
pub struct ToolShedClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl ToolShedClient {
    /// Create a client for the Tool Shed at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_settings(base_url, HTTP_TIMEOUT, MAX_RETRIES)
    }

    /// Create a client with explicit timeout and retry count
    pub fn with_settings(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        // Validate now rather than on the first request
        installable_revisions_url(base_url, &PackageKey::new("probe", "probe"))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            max_retries: max_retries.max(1),
        })
    }

    /// Get the JSON body of `url`, retrying transport failures
    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::ConnectionError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }
                    return response
                        .json()
                        .map_err(|e| Error::ParseError(format!("Invalid JSON from {url}: {e}")));
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::ConnectionError(format!(
                            "Failed to reach {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Request to {} failed (attempt {}): {}, retrying...", url, attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

impl InstallabilityOracle for ToolShedClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn installable_revisions(&self, package: &PackageKey) -> Result<Vec<String>> {
        let url = installable_revisions_url(&self.base_url, package)?;
        debug!("Fetching installable revisions for {}", package);
        let revisions: Vec<String> = self.get_json(&url)?;
        debug!("{}: installable revisions {}", package, revisions.join(","));
        Ok(revisions)
    }
}

/// Build the `get_ordered_installable_revisions` URL for a package
fn installable_revisions_url(base_url: &str, package: &PackageKey) -> Result<Url> {
    let mut base = if base_url.contains("://") {
        base_url.to_string()
    } else {
        format!("https://{base_url}")
    };
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut url = Url::parse(&base)
        .and_then(|u| u.join(INSTALLABLE_REVISIONS_PATH))
        .map_err(|e| Error::ConfigError(format!("Invalid Tool Shed URL '{base_url}': {e}")))?;
    url.query_pairs_mut()
        .append_pair("name", &package.name)
        .append_pair("owner", &package.owner);
    Ok(url)
}
