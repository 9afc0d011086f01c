// src/toolshed/mod.rs

//! Tool Shed collaborators
//!
//! Everything the reconciliation pass needs to know about a package comes
//! through these traits:
//! - which revisions the Tool Shed currently calls installable ([`ToolShedClient`])
//! - the full revision history and per-revision tool versions, read from a
//!   Mercurial clone ([`HgHistory`])
//!
//! The traits exist so passes can run against in-memory fakes in tests.

mod client;
mod hg;
pub mod tool_xml;

pub use client::ToolShedClient;
pub use hg::HgHistory;

use crate::error::Result;
use crate::package::{PackageKey, ToolVersions};

/// Source of the ordered installable revisions of a package
pub trait InstallabilityOracle {
    /// Tool Shed this oracle answers for
    fn endpoint(&self) -> &str;

    /// Installable revisions, oldest to newest.
    ///
    /// An unreachable Tool Shed yields [`crate::Error::ConnectionError`].
    fn installable_revisions(&self, package: &PackageKey) -> Result<Vec<String>>;
}

/// Source of a package's complete revision history
pub trait RevisionHistoryProvider {
    /// Every revision ever committed, oldest to newest, installable or not
    fn revisions(&self, package: &PackageKey) -> Result<Vec<String>>;

    /// Tools (id and version) defined by one revision
    fn resolve_versions(&self, package: &PackageKey, revision: &str) -> Result<ToolVersions>;
}
