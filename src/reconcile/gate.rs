// src/reconcile/gate.rs

//! Installed-system safety gate
//!
//! When the state of a live server is known, a locked revision that is still
//! deployed there must not be dropped from the lockfile, even when a safe
//! successor exists.

use crate::package::PackageKey;
use std::collections::{HashMap, HashSet};

/// Revisions actively deployed on a live server, per package.
///
/// Only revisions that are neither deleted nor uninstalled are recorded.
#[derive(Debug, Clone, Default)]
pub struct InstalledSnapshot {
    packages: HashMap<PackageKey, HashSet<String>>,
}

impl InstalledSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that the server knows the package, even with nothing active
    pub fn register(&mut self, package: PackageKey) {
        self.packages.entry(package).or_default();
    }

    pub fn insert(&mut self, package: PackageKey, revision: impl Into<String>) {
        self.packages.entry(package).or_default().insert(revision.into());
    }

    pub fn revisions(&self, package: &PackageKey) -> Option<&HashSet<String>> {
        self.packages.get(package)
    }

    pub fn is_installed(&self, package: &PackageKey, revision: &str) -> bool {
        self.packages
            .get(package)
            .is_some_and(|revisions| revisions.contains(revision))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

/// Whether removing `revision` from the lock entry must be blocked.
///
/// Without a snapshot the gate never blocks.
pub fn blocks(installed: Option<&InstalledSnapshot>, package: &PackageKey, revision: &str) -> bool {
    installed.is_some_and(|snapshot| snapshot.is_installed(package, revision))
}
