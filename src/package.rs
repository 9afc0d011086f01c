// src/package.rs

//! Package identity and resolved tool versions
//!
//! A package is a Tool Shed repository, identified by `(name, owner)` within a
//! single Tool Shed endpoint. Each revision of a repository resolves to the set
//! of tools it defines, as `(tool id, version)` pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a package within one Tool Shed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: String,
    pub owner: String,
}

impl PackageKey {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A single tool definition found in a revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolVersion {
    /// Tool id; asserts which tool is being versioned, never used for ordering
    pub tool_id: String,
    pub version: String,
}

impl ToolVersion {
    pub fn new(tool_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tool_id, self.version)
    }
}

/// Everything a revision defines. Two revisions are interchangeable only if
/// these sets are equal.
pub type ToolVersions = BTreeSet<ToolVersion>;

/// Render a version set for log lines, e.g. `bwa 0.7.17, bwa_mem 0.7.17`
pub fn describe_versions(versions: &ToolVersions) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
