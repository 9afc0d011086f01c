// src/reconcile/engine.rs

//! Per-package revision reconciliation
//!
//! For every locked revision that is no longer installable, walk history
//! forward to the first installable revision and swap it in, but only when
//! both revisions define exactly the same tools and versions and the old
//! revision is not still deployed on a live server. Anything else is left
//! exactly as it was and reported.

use super::gate::{self, InstalledSnapshot};
use super::history::RevisionHistory;
use super::patch::{Decision, Patch, Unresolved};
use super::ReconcileError;
use crate::package::{PackageKey, ToolVersions};
use std::collections::HashSet;

/// Fast path: true when every locked revision is installable.
///
/// Callers check this before fetching history; a package passing it never
/// needs `reconcile`.
pub fn is_up_to_date<L, I>(locked: &[L], installable: &[I]) -> bool
where
    L: AsRef<str>,
    I: AsRef<str>,
{
    let installable: HashSet<&str> = installable.iter().map(AsRef::as_ref).collect();
    locked.iter().all(|r| installable.contains(r.as_ref()))
}

/// Compute the patch for one package's lock entry.
///
/// `installable` must be a subset of `history`, and so must `locked`;
/// otherwise nothing is patched and the package fails as a whole.
pub fn reconcile(
    package: &PackageKey,
    history: &RevisionHistory,
    installable: &[String],
    locked: &[String],
    installed: Option<&InstalledSnapshot>,
) -> Result<Patch, ReconcileError> {
    for revision in locked.iter().chain(installable) {
        if !history.contains(revision) {
            return Err(ReconcileError::UnknownRevision {
                package: package.clone(),
                revision: revision.clone(),
            });
        }
    }

    let installable: HashSet<&str> = installable.iter().map(String::as_str).collect();
    let locked_set: HashSet<&str> = locked.iter().map(String::as_str).collect();
    let mut patch = Patch::new();

    for cur in locked {
        if installable.contains(cur.as_str()) {
            continue;
        }

        let Some(nxt) = next_installable(history, cur, &installable) else {
            patch.warn(Unresolved::NoSuccessor { revision: cur.clone() });
            continue;
        };

        if versions(package, history, cur)? != versions(package, history, nxt)? {
            patch.warn(Unresolved::VersionMismatch {
                revision: cur.clone(),
                successor: nxt.to_string(),
            });
            continue;
        }

        if gate::blocks(installed, package, cur) {
            patch.warn(Unresolved::StillInstalled {
                revision: cur.clone(),
                successor: nxt.to_string(),
            });
            continue;
        }

        let decision = if locked_set.contains(nxt) {
            Decision::Consolidated {
                removed: cur.clone(),
                kept: nxt.to_string(),
            }
        } else {
            Decision::Substituted {
                removed: cur.clone(),
                added: nxt.to_string(),
            }
        };
        patch.record(decision);
    }

    Ok(patch)
}

/// First installable revision at or after `cur`, never one older than it
fn next_installable<'h>(
    history: &'h RevisionHistory,
    cur: &str,
    installable: &HashSet<&str>,
) -> Option<&'h str> {
    let start = history.position(cur)?;
    history.from_position(start).find(|r| installable.contains(*r))
}

fn versions<'h>(
    package: &PackageKey,
    history: &'h RevisionHistory,
    revision: &str,
) -> Result<&'h ToolVersions, ReconcileError> {
    history
        .versions_of(revision)
        .ok_or_else(|| ReconcileError::UnresolvedVersion {
            package: package.clone(),
            revision: revision.to_string(),
        })
}
