// src/outdated.rs

//! The "fix outdated" pass over a whole lockfile
//!
//! Packages are handled one at a time in file order. For each one the
//! installable revisions are fetched first; history and versions are only
//! fetched when some locked revision is no longer installable. Any failure is
//! scoped to its package: it is reported and the pass moves on.

use crate::lockfile::{LockedTool, Lockfile};
use crate::package::{describe_versions, PackageKey};
use crate::reconcile::{self, InstalledSnapshot, Patch, ReconcileError, RevisionHistory, Unresolved};
use crate::toolshed::{InstallabilityOracle, RevisionHistoryProvider};
use std::fmt;
use tracing::{error, info, warn};

/// Why a package was not reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry is pinned to another Tool Shed
    ForeignToolShed(String),
    /// Installable revisions could not be fetched
    Unreachable(String),
    /// The revision history could not be fetched
    HistoryUnavailable(String),
    /// Some revision's tool versions could not be resolved
    VersionsUnavailable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignToolShed(url) => write!(f, "locked against another Tool Shed ({url})"),
            Self::Unreachable(e) => write!(f, "could not determine installable revisions: {e}"),
            Self::HistoryUnavailable(e) => write!(f, "could not determine revision history: {e}"),
            Self::VersionsUnavailable(e) => write!(f, "could not determine versions: {e}"),
        }
    }
}

impl SkipReason {
    /// History or versions were needed to resolve a discrepancy but could not
    /// be obtained. Connectivity and foreign entries are not fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HistoryUnavailable(_) | Self::VersionsUnavailable(_))
    }
}

/// What happened to one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// Every locked revision is installable; history was never fetched
    UpToDate,
    /// The engine ran; the patch may be empty and may carry warnings
    Reconciled(Patch),
    Skipped(SkipReason),
    /// Malformed input; the entry was left untouched
    Failed(ReconcileError),
}

#[derive(Debug, Clone)]
pub struct PackageReport {
    pub package: PackageKey,
    pub outcome: PackageOutcome,
}

/// Result of a full pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub packages: Vec<PackageReport>,
}

impl PassReport {
    /// Whether any lock entry was (or, in dry-run, would be) modified
    pub fn changed(&self) -> bool {
        self.patches().any(|p| !p.is_empty())
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.packages.iter().filter_map(|r| match &r.outcome {
            PackageOutcome::Reconciled(patch) => Some(patch),
            _ => None,
        })
    }

    pub fn outcome(&self, package: &PackageKey) -> Option<&PackageOutcome> {
        self.packages
            .iter()
            .find(|r| &r.package == package)
            .map(|r| &r.outcome)
    }

    pub fn up_to_date_count(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::UpToDate))
    }

    pub fn reconciled_count(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Reconciled(p) if !p.is_empty()))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Skipped(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Failed(_)))
    }

    /// Unresolved revisions across all packages
    pub fn warning_count(&self) -> usize {
        self.patches().map(|p| p.warnings.len()).sum()
    }

    fn count(&self, pred: impl Fn(&PackageOutcome) -> bool) -> usize {
        self.packages.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs reconciliation over every tool in a lockfile
pub struct OutdatedFixer<'a> {
    oracle: &'a dyn InstallabilityOracle,
    history: &'a dyn RevisionHistoryProvider,
    installed: Option<&'a InstalledSnapshot>,
    dry_run: bool,
}

impl<'a> OutdatedFixer<'a> {
    pub fn new(oracle: &'a dyn InstallabilityOracle, history: &'a dyn RevisionHistoryProvider) -> Self {
        Self {
            oracle,
            history,
            installed: None,
            dry_run: false,
        }
    }

    /// Builder: enable the installed-system safety gate
    pub fn with_installed(mut self, installed: &'a InstalledSnapshot) -> Self {
        self.installed = Some(installed);
        self
    }

    /// Builder: compute patches without applying them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile every tool in file order, applying patches in place
    pub fn run(&self, lockfile: &mut Lockfile) -> PassReport {
        let mut report = PassReport::default();
        for tool in &mut lockfile.tools {
            let package = tool.key();
            let outcome = self.process(tool);
            report.packages.push(PackageReport { package, outcome });
        }
        report
    }

    fn process(&self, tool: &mut LockedTool) -> PackageOutcome {
        let package = tool.key();
        info!("Checking {} {}", self.oracle.endpoint(), package);

        if !tool.endpoint_matches(self.oracle.endpoint()) {
            let url = tool.tool_shed_url.clone().unwrap_or_default();
            return skip(&package, SkipReason::ForeignToolShed(url));
        }

        let installable = match self.oracle.installable_revisions(&package) {
            Ok(revisions) => revisions,
            Err(e) => return skip(&package, SkipReason::Unreachable(e.to_string())),
        };

        if reconcile::is_up_to_date(&tool.revisions, &installable) {
            return PackageOutcome::UpToDate;
        }

        let history = match self.fetch_history(&package) {
            Ok(history) => history,
            Err(reason) => return skip(&package, reason),
        };

        let patch = match reconcile::reconcile(&package, &history, &installable, &tool.revisions, self.installed) {
            Ok(patch) => patch,
            Err(e) => {
                error!("{}", e);
                return PackageOutcome::Failed(e);
            }
        };

        for decision in &patch.decisions {
            info!("{}: {}", package, decision);
        }
        for warning in &patch.warnings {
            match warning {
                Unresolved::VersionMismatch { revision, successor } => warn!(
                    "{}: {} ({} defines {}, {} defines {})",
                    package,
                    warning,
                    revision,
                    describe(&history, revision),
                    successor,
                    describe(&history, successor)
                ),
                _ => warn!("{}: {}", package, warning),
            }
        }

        if !self.dry_run {
            tool.apply_patch(&patch);
        }
        PackageOutcome::Reconciled(patch)
    }

    fn fetch_history(&self, package: &PackageKey) -> Result<RevisionHistory, SkipReason> {
        let revisions = self
            .history
            .revisions(package)
            .map_err(|e| SkipReason::HistoryUnavailable(e.to_string()))?;

        let mut history = RevisionHistory::from_oldest_first(revisions);
        for revision in history.revisions().to_vec() {
            let versions = self
                .history
                .resolve_versions(package, &revision)
                .map_err(|e| SkipReason::VersionsUnavailable(format!("{revision}: {e}")))?;
            history.set_versions(&revision, versions);
        }
        Ok(history)
    }
}

fn skip(package: &PackageKey, reason: SkipReason) -> PackageOutcome {
    if reason.is_fatal() {
        error!("Skipping {}: {}", package, reason);
    } else {
        warn!("Skipping {}: {}", package, reason);
    }
    PackageOutcome::Skipped(reason)
}

/// Version set of a revision for log lines
fn describe(history: &RevisionHistory, revision: &str) -> String {
    history
        .versions_of(revision)
        .map(describe_versions)
        .unwrap_or_else(|| "nothing".to_string())
}
