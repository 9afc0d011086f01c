// src/reconcile/patch.rs

//! Reconciliation output: revisions to drop, revisions to add, and the
//! cases that were left alone.

use std::fmt;

/// Why a locked revision was left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    NoSuccessor,
    VersionMismatch,
    StillInstalled,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuccessor => write!(f, "NO_SUCCESSOR"),
            Self::VersionMismatch => write!(f, "VERSION_MISMATCH"),
            Self::StillInstalled => write!(f, "STILL_INSTALLED"),
        }
    }
}

/// A locked, non-installable revision the engine refused to touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// Nothing at or after the revision in history is installable
    NoSuccessor { revision: String },

    /// The next installable revision defines different tools or versions
    VersionMismatch { revision: String, successor: String },

    /// A safe successor exists but the revision is still deployed
    StillInstalled { revision: String, successor: String },
}

impl Unresolved {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::NoSuccessor { .. } => ReasonCode::NoSuccessor,
            Self::VersionMismatch { .. } => ReasonCode::VersionMismatch,
            Self::StillInstalled { .. } => ReasonCode::StillInstalled,
        }
    }

    /// The locked revision this warning is about
    pub fn revision(&self) -> &str {
        match self {
            Self::NoSuccessor { revision }
            | Self::VersionMismatch { revision, .. }
            | Self::StillInstalled { revision, .. } => revision,
        }
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuccessor { revision } => {
                write!(f, "{}({}): no installable revision follows", self.reason(), revision)
            }
            Self::VersionMismatch { revision, successor } => write!(
                f,
                "{}({}, {}): versions differ, needs a deliberate version bump",
                self.reason(),
                revision,
                successor
            ),
            Self::StillInstalled { revision, successor } => write!(
                f,
                "{}({}): still installed, not replacing with {}",
                self.reason(),
                revision,
                successor
            ),
        }
    }
}

/// A replacement the engine scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The successor was already locked; only the stale revision goes
    Consolidated { removed: String, kept: String },

    /// The stale revision is swapped for its successor
    Substituted { removed: String, added: String },
}

impl Decision {
    pub fn removed(&self) -> &str {
        match self {
            Self::Consolidated { removed, .. } | Self::Substituted { removed, .. } => removed,
        }
    }

    /// The revision that takes over from the removed one
    pub fn replacement(&self) -> &str {
        match self {
            Self::Consolidated { kept, .. } => kept,
            Self::Substituted { added, .. } => added,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consolidated { removed, kept } => {
                write!(f, "remove {} in favor of already locked {}", removed, kept)
            }
            Self::Substituted { removed, added } => {
                write!(f, "replace {} with {}", removed, added)
            }
        }
    }
}

/// Changes to one package's lock entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// Revisions to drop from the lock entry
    pub remove: Vec<String>,

    /// Revisions to add, each at most once
    pub add: Vec<String>,

    /// One entry per scheduled replacement
    pub decisions: Vec<Decision>,

    /// Locked revisions left untouched
    pub warnings: Vec<Unresolved>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when applying the patch would not change the lock entry
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    pub fn removes(&self, revision: &str) -> bool {
        self.remove.iter().any(|r| r == revision)
    }

    pub fn adds(&self, revision: &str) -> bool {
        self.add.iter().any(|r| r == revision)
    }

    pub(crate) fn record(&mut self, decision: Decision) {
        let removed = decision.removed().to_string();
        if !self.removes(&removed) {
            self.remove.push(removed);
        }
        if let Decision::Substituted { added, .. } = &decision {
            if !self.adds(added) {
                self.add.push(added.clone());
            }
        }
        self.decisions.push(decision);
    }

    pub(crate) fn warn(&mut self, warning: Unresolved) {
        self.warnings.push(warning);
    }

    /// Warnings with a given reason
    pub fn warnings_with(&self, reason: ReasonCode) -> impl Iterator<Item = &Unresolved> {
        self.warnings.iter().filter(move |w| w.reason() == reason)
    }
}
