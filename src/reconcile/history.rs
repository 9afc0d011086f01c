// src/reconcile/history.rs

//! Ordered revision history of one package
//!
//! Holds every revision ever committed to a repository, oldest first, with an
//! id → position index built once so forward scans never search linearly for
//! their starting point.

use crate::package::ToolVersions;
use std::collections::HashMap;

/// Full revision history of a package, oldest to newest
#[derive(Debug, Clone, Default)]
pub struct RevisionHistory {
    revisions: Vec<String>,
    index: HashMap<String, usize>,
    versions: HashMap<String, ToolVersions>,
}

impl RevisionHistory {
    /// Build a history from revision ids ordered oldest to newest.
    ///
    /// A repeated id keeps its first (oldest) position.
    pub fn from_oldest_first<I, S>(revisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut history = Self::default();
        for revision in revisions {
            let revision = revision.into();
            if history.index.contains_key(&revision) {
                continue;
            }
            history.index.insert(revision.clone(), history.revisions.len());
            history.revisions.push(revision);
        }
        history
    }

    /// Record the resolved tool versions of one revision
    pub fn set_versions(&mut self, revision: &str, versions: ToolVersions) {
        self.versions.insert(revision.to_string(), versions);
    }

    /// Position of a revision in history, if it exists
    pub fn position(&self, revision: &str) -> Option<usize> {
        self.index.get(revision).copied()
    }

    pub fn contains(&self, revision: &str) -> bool {
        self.index.contains_key(revision)
    }

    /// Revisions from `start` (inclusive) towards the newest
    pub fn from_position(&self, start: usize) -> impl Iterator<Item = &str> {
        self.revisions.iter().skip(start).map(String::as_str)
    }

    /// Resolved tool versions of a revision
    pub fn versions_of(&self, revision: &str) -> Option<&ToolVersions> {
        self.versions.get(revision)
    }

    pub fn revisions(&self) -> &[String] {
        &self.revisions
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}
