// src/reconcile/mod.rs

//! Revision reconciliation
//!
//! Aligns a package's locked revisions with what the Tool Shed currently
//! considers installable. Revisions may be withdrawn from installability while
//! a later revision carries the same tool versions (a content-only update);
//! such revisions can be swapped transparently. Everything here is pure: all
//! inputs arrive already fetched, and the decision to fetch lazily belongs to
//! the caller (see [`crate::outdated`]).
//!
//! # Flow
//!
//! 1. [`is_up_to_date`] - cheap containment check, done before any history fetch
//! 2. [`reconcile`] - forward search, version-equality gate, safety gate
//! 3. the resulting [`Patch`] is applied by the lockfile owner

mod engine;
mod gate;
mod history;
mod patch;

pub use engine::{is_up_to_date, reconcile};
pub use gate::{blocks, InstalledSnapshot};
pub use history::RevisionHistory;
pub use patch::{Decision, Patch, ReasonCode, Unresolved};

use crate::package::PackageKey;
use thiserror::Error;

/// Malformed input for one package; nothing is patched for it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("{revision} is not a valid revision of {package}")]
    UnknownRevision { package: PackageKey, revision: String },

    #[error("no resolved version for revision {revision} of {package}")]
    UnresolvedVersion { package: PackageKey, revision: String },
}
