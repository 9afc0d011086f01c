// src/toolshed/hg.rs

//! Revision history from Mercurial clones of Tool Shed repositories
//!
//! The Tool Shed API only reports installable revisions, so the full history
//! and the tool versions of every revision come from a local clone, kept under
//! the cache directory and refreshed with `hg pull -u`.

use super::tool_xml::{self, XmlRoot};
use super::RevisionHistoryProvider;
use crate::error::{Error, Result};
use crate::lockfile::normalize_tool_shed_url;
use crate::package::{PackageKey, ToolVersions};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// History provider backed by `hg`
pub struct HgHistory {
    toolshed_url: String,
    cache_dir: PathBuf,
    /// Absent when no `hg` was found; every history request then fails
    hg: Option<PathBuf>,
    /// Packages already cloned or pulled by this instance
    synced: RefCell<HashSet<PackageKey>>,
}

impl HgHistory {
    /// Create a provider cloning from `toolshed_url` into `cache_dir`,
    /// using the `hg` found on `PATH`.
    ///
    /// A missing `hg` only matters once some package needs its history.
    pub fn new(toolshed_url: &str, cache_dir: &Path) -> Self {
        let mut provider = Self::with_hg_binary(toolshed_url, cache_dir, PathBuf::new());
        provider.hg = match which::which("hg") {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Mercurial (hg) not found: {}", e);
                None
            }
        };
        provider
    }

    /// Create a provider using a specific `hg` executable
    pub fn with_hg_binary(toolshed_url: &str, cache_dir: &Path, hg: PathBuf) -> Self {
        Self {
            toolshed_url: toolshed_url.trim_end_matches('/').to_string(),
            cache_dir: cache_dir.to_path_buf(),
            hg: Some(hg),
            synced: RefCell::new(HashSet::new()),
        }
    }

    /// Local clone location, unique per Tool Shed and package
    pub fn checkout_dir(&self, package: &PackageKey) -> PathBuf {
        let shed = normalize_tool_shed_url(&self.toolshed_url).replace(['/', ':'], "_");
        self.cache_dir
            .join(format!("{}-{}-{}", shed, package.owner, package.name))
    }

    fn repository_url(&self, package: &PackageKey) -> String {
        format!("{}/repos/{}/{}", self.toolshed_url, package.owner, package.name)
    }

    fn hg(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let hg = self
            .hg
            .as_ref()
            .ok_or_else(|| Error::CommandError("Mercurial (hg) is not installed".to_string()))?;
        let mut cmd = Command::new(hg);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .map_err(|e| Error::CommandError(format!("Failed to run hg {}: {e}", args.join(" "))))?;

        if !output.status.success() {
            return Err(Error::CommandError(format!(
                "hg {} failed in {}: {}",
                args.join(" "),
                cwd.map(|d| d.display().to_string()).unwrap_or_else(|| ".".into()),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Clone or refresh the package's repository, once per instance
    fn sync(&self, package: &PackageKey) -> Result<PathBuf> {
        let dir = self.checkout_dir(package);
        if self.synced.borrow().contains(package) {
            return Ok(dir);
        }

        if dir.exists() {
            debug!("Pulling {} in {}", package, dir.display());
            self.hg(&["pull", "-u"], Some(&dir))?;
        } else {
            fs::create_dir_all(&self.cache_dir).map_err(|e| {
                Error::IoError(format!("Failed to create {}: {e}", self.cache_dir.display()))
            })?;
            let url = self.repository_url(package);
            let target = dir.to_string_lossy().into_owned();
            info!("Cloning {} into {}", url, target);
            self.hg(&["clone", &url, &target], None)?;
        }

        self.synced.borrow_mut().insert(package.clone());
        Ok(dir)
    }
}

impl RevisionHistoryProvider for HgHistory {
    fn revisions(&self, package: &PackageKey) -> Result<Vec<String>> {
        let dir = self.sync(package)?;
        self.hg(&["update", "tip"], Some(&dir))?;
        let log = self.hg(&["log", "--template", "{node|short}\n"], Some(&dir))?;

        // hg log lists newest first
        let mut revisions: Vec<String> = log
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        revisions.reverse();

        debug!("{}: {} revisions in history", package, revisions.len());
        Ok(revisions)
    }

    fn resolve_versions(&self, package: &PackageKey, revision: &str) -> Result<ToolVersions> {
        let dir = self.sync(package)?;
        self.hg(&["update", "--clean", "-r", revision], Some(&dir))?;

        let versions = scan_working_copy(&dir)?;
        if versions.is_empty() {
            return Err(Error::NotFoundError(format!(
                "no tool definitions in revision {revision} of {package}"
            )));
        }
        Ok(versions)
    }
}

/// Collect tool versions defined anywhere in a working copy
fn scan_working_copy(dir: &Path) -> Result<ToolVersions> {
    let mut tokens = HashMap::new();
    let mut roots = Vec::new();

    let walker = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".hg");

    for entry in walker {
        let entry = entry.map_err(|e| Error::IoError(format!("Failed to walk {}: {e}", dir.display())))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "xml") {
            continue;
        }

        let bytes = fs::read(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;
        // Repositories routinely carry XML that is not a tool; skip what does not parse
        match tool_xml::scan(&String::from_utf8_lossy(&bytes)) {
            Ok(scanned) => {
                tokens.extend(scanned.tokens);
                if matches!(scanned.root, XmlRoot::Tool { .. }) {
                    roots.push(scanned.root);
                }
            }
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(roots
        .iter()
        .filter_map(|root| tool_xml::tool_version(root, &tokens))
        .collect())
}
