// src/commands/fix.rs
//! Fix-outdated command

use anyhow::{Context, Result};
use revlock::galaxy::GalaxyClient;
use revlock::toolshed::{HgHistory, ToolShedClient};
use revlock::{Config, Lockfile, OutdatedFixer, PackageOutcome, PassReport};
use std::path::Path;
use tracing::info;

/// Reconcile a lockfile against the configured Tool Shed
pub fn cmd_fix_outdated(config: &Config, lockfile_path: &Path, dry_run: bool) -> Result<()> {
    let mut lockfile = Lockfile::from_file(lockfile_path)
        .with_context(|| format!("Failed to load {}", lockfile_path.display()))?;

    let toolshed = ToolShedClient::with_settings(&config.toolshed_url, config.http_timeout(), config.max_retries)?;
    let history = HgHistory::new(&config.toolshed_url, &config.cache_dir);

    // The safety gate is only as good as this snapshot, so failing to fetch it is fatal
    let installed = match &config.galaxy_url {
        Some(url) => {
            let galaxy = GalaxyClient::with_timeout(url, config.galaxy_api_key.clone(), config.http_timeout())?;
            Some(
                galaxy
                    .installed_snapshot()
                    .with_context(|| format!("Failed to read installed repositories from {url}"))?,
            )
        }
        None => None,
    };

    let mut fixer = OutdatedFixer::new(&toolshed, &history).dry_run(dry_run);
    if let Some(snapshot) = &installed {
        fixer = fixer.with_installed(snapshot);
    }

    info!("Reconciling {} tools in {}", lockfile.tools.len(), lockfile_path.display());
    let report = fixer.run(&mut lockfile);
    print_report(&report);

    if !report.changed() {
        println!("Lockfile is already consistent");
    } else if dry_run {
        println!("Dry run: {} not modified", lockfile_path.display());
    } else {
        lockfile
            .write_to_file(lockfile_path)
            .with_context(|| format!("Failed to write {}", lockfile_path.display()))?;
        println!("Updated {}", lockfile_path.display());
    }

    Ok(())
}

fn print_report(report: &PassReport) {
    for entry in &report.packages {
        match &entry.outcome {
            PackageOutcome::Reconciled(patch) if !patch.is_empty() => {
                println!("{}:", entry.package);
                for decision in &patch.decisions {
                    println!("  {}", decision);
                }
            }
            PackageOutcome::Failed(e) => println!("{}: failed: {}", entry.package, e),
            _ => {}
        }
    }

    println!(
        "{} tools: {} up to date, {} changed, {} skipped, {} failed, {} unresolved revision(s)",
        report.packages.len(),
        report.up_to_date_count(),
        report.reconciled_count(),
        report.skipped_count(),
        report.failed_count(),
        report.warning_count()
    );
}
