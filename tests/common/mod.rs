// tests/common/mod.rs

//! Shared test utilities: in-memory Tool Shed collaborators.

#![allow(dead_code)]

use revlock::toolshed::{InstallabilityOracle, RevisionHistoryProvider};
use revlock::{Error, LockedTool, Lockfile, PackageKey, Result, ToolVersion, ToolVersions};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub const TOOLSHED: &str = "https://toolshed.g2.bx.psu.edu";

pub fn key(name: &str, owner: &str) -> PackageKey {
    PackageKey::new(name, owner)
}

/// Single-tool version set
pub fn single(tool_id: &str, version: &str) -> ToolVersions {
    [ToolVersion::new(tool_id, version)].into_iter().collect()
}

/// Installability oracle answering from a table
#[derive(Default)]
pub struct FakeToolShed {
    installable: HashMap<PackageKey, Vec<String>>,
    unreachable: HashSet<PackageKey>,
    pub queries: RefCell<Vec<PackageKey>>,
}

impl FakeToolShed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installable(mut self, name: &str, owner: &str, revisions: &[&str]) -> Self {
        self.installable
            .insert(key(name, owner), revisions.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn unreachable(mut self, name: &str, owner: &str) -> Self {
        self.unreachable.insert(key(name, owner));
        self
    }
}

impl InstallabilityOracle for FakeToolShed {
    fn endpoint(&self) -> &str {
        TOOLSHED
    }

    fn installable_revisions(&self, package: &PackageKey) -> Result<Vec<String>> {
        self.queries.borrow_mut().push(package.clone());
        if self.unreachable.contains(package) {
            return Err(Error::ConnectionError(format!("{package}: connection refused")));
        }
        Ok(self.installable.get(package).cloned().unwrap_or_default())
    }
}

/// History provider answering from a table, recording every request
#[derive(Default)]
pub struct FakeHistory {
    packages: HashMap<PackageKey, Vec<(String, ToolVersions)>>,
    unresolvable: HashSet<(PackageKey, String)>,
    pub history_requests: RefCell<Vec<PackageKey>>,
    pub version_requests: RefCell<Vec<(PackageKey, String)>>,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package whose revisions each define one tool named like the package
    pub fn package(mut self, name: &str, owner: &str, revisions: &[(&str, &str)]) -> Self {
        let entries = revisions
            .iter()
            .map(|(r, v)| (r.to_string(), single(name, v)))
            .collect();
        self.packages.insert(key(name, owner), entries);
        self
    }

    pub fn unresolvable(mut self, name: &str, owner: &str, revision: &str) -> Self {
        self.unresolvable.insert((key(name, owner), revision.to_string()));
        self
    }

    pub fn was_fetched(&self, package: &PackageKey) -> bool {
        self.history_requests.borrow().contains(package)
    }
}

impl RevisionHistoryProvider for FakeHistory {
    fn revisions(&self, package: &PackageKey) -> Result<Vec<String>> {
        self.history_requests.borrow_mut().push(package.clone());
        self.packages
            .get(package)
            .map(|entries| entries.iter().map(|(r, _)| r.clone()).collect())
            .ok_or_else(|| Error::CommandError(format!("hg clone failed for {package}")))
    }

    fn resolve_versions(&self, package: &PackageKey, revision: &str) -> Result<ToolVersions> {
        self.version_requests
            .borrow_mut()
            .push((package.clone(), revision.to_string()));
        if self.unresolvable.contains(&(package.clone(), revision.to_string())) {
            return Err(Error::NotFoundError(format!("no tools in {revision}")));
        }
        self.packages
            .get(package)
            .and_then(|entries| entries.iter().find(|(r, _)| r == revision))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::NotFoundError(format!("unknown revision {revision}")))
    }
}

pub fn lockfile(tools: Vec<LockedTool>) -> Lockfile {
    Lockfile {
        tools,
        ..Lockfile::default()
    }
}
