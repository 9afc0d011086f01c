// src/galaxy.rs

//! Installed-state lookup on a live Galaxy server
//!
//! Feeds the reconciliation safety gate: a revision that is still installed on
//! the server stays in the lockfile.

use crate::error::{Error, Result};
use crate::package::PackageKey;
use crate::reconcile::InstalledSnapshot;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "x-api-key";

/// One entry of `GET /api/tool_shed_repositories`
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledRepository {
    pub name: String,
    pub owner: String,
    pub changeset_revision: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub uninstalled: bool,
}

impl InstalledRepository {
    /// Whether the revision is actually deployed
    pub fn is_active(&self) -> bool {
        !self.deleted && !self.uninstalled
    }
}

/// Galaxy API client
pub struct GalaxyClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GalaxyClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List every Tool Shed repository the server knows about
    pub fn repositories(&self) -> Result<Vec<InstalledRepository>> {
        let url = format!("{}/api/tool_shed_repositories", self.base_url);
        info!("Fetching installed repositories from {}", self.base_url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .map_err(|e| Error::ConnectionError(format!("Failed to reach {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::ConnectionError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json()
            .map_err(|e| Error::ParseError(format!("Invalid JSON from {url}: {e}")))
    }

    /// Snapshot of the revisions currently deployed on the server
    pub fn installed_snapshot(&self) -> Result<InstalledSnapshot> {
        let snapshot = snapshot_from_repositories(&self.repositories()?);
        debug!("{} packages known to {}", snapshot.package_count(), self.base_url);
        Ok(snapshot)
    }
}

/// Build a snapshot, ignoring deleted and uninstalled revisions.
///
/// Packages with only inactive revisions are still registered.
pub fn snapshot_from_repositories(repositories: &[InstalledRepository]) -> InstalledSnapshot {
    let mut snapshot = InstalledSnapshot::new();
    for repo in repositories {
        let key = PackageKey::new(&repo.name, &repo.owner);
        if repo.is_active() {
            snapshot.insert(key, repo.changeset_revision.clone());
        } else {
            snapshot.register(key);
        }
    }
    snapshot
}
