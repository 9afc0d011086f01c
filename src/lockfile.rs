// src/lockfile.rs

//! Tool lockfile (`tools.yaml.lock`)
//!
//! The lockfile pins, for every Tool Shed repository a Galaxy server should
//! carry, the set of changeset revisions to install. Packages are processed in
//! file order; unknown keys are carried through a rewrite untouched.
//!
//! # Example
//!
//! ```yaml
//! install_tool_dependencies: true
//! tools:
//! - name: bwa
//!   owner: devteam
//!   revisions:
//!   - 3fe632431b68
//!   - 51b6bd2bce2b
//!   tool_panel_section_label: Mapping
//!   tool_shed_url: toolshed.g2.bx.psu.edu
//! ```

use crate::package::PackageKey;
use crate::reconcile::Patch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Tool Shed used when an entry does not name one
pub const DEFAULT_TOOL_SHED_URL: &str = "https://toolshed.g2.bx.psu.edu";

#[derive(Error, Debug)]
pub enum LockfileError {
    #[error("Failed to read lockfile: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse lockfile: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Failed to write lockfile {path}: {reason}")]
    WriteError { path: String, reason: String },
}

/// Lockfile root structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Lockfile {
    #[serde(default)]
    pub tools: Vec<LockedTool>,

    /// Top-level keys this tool does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// One locked Tool Shed repository
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockedTool {
    pub name: String,
    pub owner: String,

    /// Locked changeset revisions; order is kept as written
    #[serde(default)]
    pub revisions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_shed_url: Option<String>,

    /// Entry keys this tool does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Lockfile {
    /// Load lockfile from a path
    pub fn from_file(path: &Path) -> Result<Self, LockfileError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse lockfile from a YAML string
    pub fn parse(content: &str) -> Result<Self, LockfileError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, LockfileError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write lockfile to a path.
    ///
    /// The content goes to a temporary file next to `path` which is then
    /// renamed over it, so readers never observe a half-written lockfile.
    pub fn write_to_file(&self, path: &Path) -> Result<(), LockfileError> {
        let content = self.to_yaml()?;
        let write_error = |reason: String| LockfileError::WriteError {
            path: path.display().to_string(),
            reason,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| write_error(e.to_string()))?;
        temp.persist(path).map_err(|e| write_error(e.error.to_string()))?;
        Ok(())
    }

    /// Get a locked tool by package identity
    pub fn get_tool(&self, key: &PackageKey) -> Option<&LockedTool> {
        self.tools
            .iter()
            .find(|t| t.name == key.name && t.owner == key.owner)
    }

    /// Total number of locked revisions across all tools
    pub fn total_revisions(&self) -> usize {
        self.tools.iter().map(|t| t.revisions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl LockedTool {
    /// Create a new locked tool with no revisions
    pub fn new(name: &str, owner: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            ..Self::default()
        }
    }

    /// Builder: set revisions
    pub fn with_revisions(mut self, revisions: &[&str]) -> Self {
        self.revisions = revisions.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Builder: set Tool Shed URL
    pub fn with_tool_shed_url(mut self, url: &str) -> Self {
        self.tool_shed_url = Some(url.to_string());
        self
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.name, &self.owner)
    }

    /// Whether this entry may be checked against the Tool Shed at `url`.
    ///
    /// Entries without a URL follow whichever Tool Shed the caller targets.
    pub fn endpoint_matches(&self, url: &str) -> bool {
        self.tool_shed_url
            .as_deref()
            .is_none_or(|own| normalize_tool_shed_url(own) == normalize_tool_shed_url(url))
    }

    /// Apply a reconciliation patch: drop removals, then append additions
    /// that are not already locked.
    pub fn apply_patch(&mut self, patch: &Patch) {
        self.revisions.retain(|r| !patch.removes(r));
        for added in &patch.add {
            if !self.revisions.contains(added) {
                self.revisions.push(added.clone());
            }
        }
    }

    /// Lock an extra revision, keeping revisions sorted and unique.
    ///
    /// Returns false if it was already locked.
    pub fn lock_revision(&mut self, revision: &str) -> bool {
        if self.revisions.iter().any(|r| r == revision) {
            return false;
        }
        self.revisions.push(revision.to_string());
        self.revisions.sort();
        self.revisions.dedup();
        true
    }
}

/// Strip scheme and trailing slashes so `toolshed.g2.bx.psu.edu` and
/// `https://toolshed.g2.bx.psu.edu/` compare equal
pub fn normalize_tool_shed_url(url: &str) -> &str {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    url.trim_end_matches('/')
}
