// src/lib.rs

//! revlock - Tool lockfile reconciliation
//!
//! Keeps a Galaxy tool lockfile installable. Tool Shed repositories are
//! versioned twice: by the tool version a human assigns, and by changeset
//! revisions that can advance without a version bump. When the Tool Shed stops
//! offering a locked revision, revlock finds the next installable revision with
//! identical tool versions and swaps it in; anything less certain is reported
//! and left alone.
//!
//! # Architecture
//!
//! - [`reconcile`] - the pure decision engine (no I/O)
//! - [`toolshed`] / [`galaxy`] - collaborators: installability, history, installed state
//! - [`outdated`] / [`update`] - passes over a whole [`lockfile::Lockfile`]
//! - [`config`] - layered runtime configuration

pub mod config;
mod error;
pub mod galaxy;
pub mod lockfile;
pub mod outdated;
pub mod package;
pub mod reconcile;
pub mod toolshed;
pub mod update;

pub use config::Config;
pub use error::{Error, Result};
pub use lockfile::{LockedTool, Lockfile, LockfileError};
pub use outdated::{OutdatedFixer, PackageOutcome, PassReport, SkipReason};
pub use package::{PackageKey, ToolVersion, ToolVersions};
pub use reconcile::{
    is_up_to_date, reconcile, Decision, InstalledSnapshot, Patch, ReasonCode, ReconcileError,
    RevisionHistory, Unresolved,
};
pub use update::{update_lockfile, ConnectToolShed, UpdateFilter, UpdateOutcome, UpdateReport};
