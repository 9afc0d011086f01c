// tests/fix_outdated.rs

//! Full reconciliation passes over lockfiles with in-memory collaborators.

mod common;

use common::{key, lockfile, FakeHistory, FakeToolShed};
use revlock::{
    InstalledSnapshot, LockedTool, Lockfile, OutdatedFixer, PackageOutcome, ReasonCode, ReconcileError,
    SkipReason, Unresolved,
};

fn reconciled(outcome: Option<&PackageOutcome>) -> &revlock::Patch {
    match outcome {
        Some(PackageOutcome::Reconciled(patch)) => patch,
        other => panic!("expected a reconciled package, got {:?}", other),
    }
}

#[test]
fn test_equal_version_successor_replaces_locked_revision() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2", "r4"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0"), ("r3", "2.0"), ("r4", "2.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    let patch = reconciled(report.outcome(&key("bwa", "devteam")));
    assert_eq!(patch.remove, vec!["r1"]);
    assert_eq!(patch.add, vec!["r2"]);
    assert_eq!(lock.tools[0].revisions, vec!["r2"]);
    assert!(report.changed());
}

#[test]
fn test_version_mismatch_is_reported_not_applied() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2", "r4"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.1"), ("r3", "2.0"), ("r4", "2.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    let patch = reconciled(report.outcome(&key("bwa", "devteam")));
    assert!(patch.is_empty());
    assert_eq!(
        patch.warnings,
        vec![Unresolved::VersionMismatch {
            revision: "r1".into(),
            successor: "r2".into()
        }]
    );
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
    assert!(!report.changed());
    assert_eq!(report.warning_count(), 1);
}

#[test]
fn test_installable_lock_skips_history_fetch() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r1"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    assert_eq!(report.outcome(&key("bwa", "devteam")), Some(&PackageOutcome::UpToDate));
    assert!(history.history_requests.borrow().is_empty());
    assert!(history.version_requests.borrow().is_empty());
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
}

#[test]
fn test_installed_revision_stays_locked() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r3"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0"), ("r3", "1.0")]);
    let mut installed = InstalledSnapshot::new();
    installed.insert(key("bwa", "devteam"), "r1");
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history)
        .with_installed(&installed)
        .run(&mut lock);

    let patch = reconciled(report.outcome(&key("bwa", "devteam")));
    assert!(patch.is_empty());
    assert_eq!(
        patch.warnings,
        vec![Unresolved::StillInstalled {
            revision: "r1".into(),
            successor: "r3".into()
        }]
    );
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
}

#[test]
fn test_nothing_installable_leaves_entry() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &[]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0"), ("r3", "1.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    let patch = reconciled(report.outcome(&key("bwa", "devteam")));
    assert!(patch.is_empty());
    assert_eq!(patch.warnings_with(ReasonCode::NoSuccessor).count(), 1);
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
}

#[test]
fn test_unreachable_package_does_not_stop_pass() {
    let shed = FakeToolShed::new()
        .unreachable("bwa", "devteam")
        .installable("fastqc", "devteam", &["f2"]);
    let history = FakeHistory::new()
        .package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")])
        .package("fastqc", "devteam", &[("f1", "0.72"), ("f2", "0.72")]);
    let mut lock = lockfile(vec![
        LockedTool::new("bwa", "devteam").with_revisions(&["r1"]),
        LockedTool::new("fastqc", "devteam").with_revisions(&["f1"]),
    ]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    assert!(matches!(
        report.outcome(&key("bwa", "devteam")),
        Some(PackageOutcome::Skipped(SkipReason::Unreachable(_)))
    ));
    assert!(!history.was_fetched(&key("bwa", "devteam")));
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
    assert_eq!(lock.tools[1].revisions, vec!["f2"]);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.reconciled_count(), 1);
}

#[test]
fn test_unknown_locked_revision_fails_only_that_package() {
    let shed = FakeToolShed::new()
        .installable("bwa", "devteam", &["r2"])
        .installable("fastqc", "devteam", &["f2"]);
    let history = FakeHistory::new()
        .package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")])
        .package("fastqc", "devteam", &[("f1", "0.72"), ("f2", "0.72")]);
    let mut lock = lockfile(vec![
        LockedTool::new("bwa", "devteam").with_revisions(&["r1", "deadbeef"]),
        LockedTool::new("fastqc", "devteam").with_revisions(&["f1"]),
    ]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    match report.outcome(&key("bwa", "devteam")) {
        Some(PackageOutcome::Failed(ReconcileError::UnknownRevision { revision, .. })) => {
            assert_eq!(revision, "deadbeef")
        }
        other => panic!("expected failure, got {:?}", other),
    }
    // No partial patch: r1 had a valid successor but nothing changed
    assert_eq!(lock.tools[0].revisions, vec!["r1", "deadbeef"]);
    assert_eq!(lock.tools[1].revisions, vec!["f2"]);
    assert_eq!(report.failed_count(), 1);
}

#[test]
fn test_version_resolution_failure_skips_package() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2"]);
    let history = FakeHistory::new()
        .package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")])
        .unresolvable("bwa", "devteam", "r2");
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    assert!(matches!(
        report.outcome(&key("bwa", "devteam")),
        Some(PackageOutcome::Skipped(SkipReason::VersionsUnavailable(_)))
    ));
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
}

#[test]
fn test_history_failure_skips_package() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2"]);
    let history = FakeHistory::new();
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    assert!(matches!(
        report.outcome(&key("bwa", "devteam")),
        Some(PackageOutcome::Skipped(SkipReason::HistoryUnavailable(_)))
    ));
}

#[test]
fn test_foreign_tool_shed_entry_is_skipped() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam")
        .with_revisions(&["r1"])
        .with_tool_shed_url("https://testtoolshed.g2.bx.psu.edu")]);

    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);

    assert!(matches!(
        report.outcome(&key("bwa", "devteam")),
        Some(PackageOutcome::Skipped(SkipReason::ForeignToolShed(_)))
    ));
    assert!(shed.queries.borrow().is_empty());
}

#[test]
fn test_dry_run_reports_without_applying() {
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r2"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")]);
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1"])]);

    let report = OutdatedFixer::new(&shed, &history).dry_run(true).run(&mut lock);

    assert!(report.changed());
    assert_eq!(lock.tools[0].revisions, vec!["r1"]);
}

#[test]
fn test_stale_revisions_sharing_a_successor() {
    // r1 and r2 share version 1.0 with installable r3; r4 (2.0) is already fine
    let shed = FakeToolShed::new().installable("bwa", "devteam", &["r3", "r4"]);
    let history = FakeHistory::new().package(
        "bwa",
        "devteam",
        &[("r1", "1.0"), ("r2", "1.0"), ("r3", "1.0"), ("r4", "2.0")],
    );
    let mut lock = lockfile(vec![LockedTool::new("bwa", "devteam").with_revisions(&["r1", "r4", "r2"])]);

    OutdatedFixer::new(&shed, &history).run(&mut lock);
    assert_eq!(lock.tools[0].revisions, vec!["r4", "r3"]);

    // A second pass finds nothing to do and never fetches history again
    let history_calls = history.history_requests.borrow().len();
    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);
    assert!(!report.changed());
    assert_eq!(report.up_to_date_count(), 1);
    assert_eq!(history.history_requests.borrow().len(), history_calls);
}

#[test]
fn test_pass_over_lockfile_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.yaml.lock");
    std::fs::write(
        &path,
        r#"install_tool_dependencies: true
tools:
- name: bwa
  owner: devteam
  revisions:
  - r1
  tool_panel_section_label: Mapping
- name: fastqc
  owner: devteam
  revisions:
  - f1
"#,
    )
    .unwrap();

    let shed = FakeToolShed::new()
        .installable("bwa", "devteam", &["r2"])
        .installable("fastqc", "devteam", &["f1"]);
    let history = FakeHistory::new().package("bwa", "devteam", &[("r1", "1.0"), ("r2", "1.0")]);

    let mut lock = Lockfile::from_file(&path).unwrap();
    let report = OutdatedFixer::new(&shed, &history).run(&mut lock);
    assert!(report.changed());
    lock.write_to_file(&path).unwrap();

    let reloaded = Lockfile::from_file(&path).unwrap();
    assert_eq!(reloaded.tools[0].revisions, vec!["r2"]);
    assert_eq!(reloaded.tools[0].tool_panel_section_label.as_deref(), Some("Mapping"));
    assert_eq!(reloaded.tools[1].revisions, vec!["f1"]);
    assert!(reloaded.extra.contains_key("install_tool_dependencies"));
}
