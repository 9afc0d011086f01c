// src/commands/update.rs
//! Update command

use anyhow::{Context, Result};
use revlock::toolshed::{InstallabilityOracle, ToolShedClient};
use revlock::{Config, Lockfile, UpdateFilter, update_lockfile};
use std::path::Path;

/// Lock the newest installable revision of every tool matching `filter`
pub fn cmd_update(config: &Config, lockfile_path: &Path, filter: &UpdateFilter, dry_run: bool) -> Result<()> {
    let mut lockfile = Lockfile::from_file(lockfile_path)
        .with_context(|| format!("Failed to load {}", lockfile_path.display()))?;

    // Validate the default Tool Shed up front; pinned ones are opened lazily
    ToolShedClient::with_settings(&config.toolshed_url, config.http_timeout(), config.max_retries)?;
    let connect = |url: &str| -> revlock::Result<Box<dyn InstallabilityOracle>> {
        let client = ToolShedClient::with_settings(url, config.http_timeout(), config.max_retries)?;
        Ok(Box::new(client))
    };
    let report = update_lockfile(&mut lockfile, &config.toolshed_url, &connect, filter);

    for (package, revision) in report.added() {
        println!("{}: locked {}", package, revision);
    }

    if !report.changed() {
        println!("No newer revisions found");
        return Ok(());
    }

    if dry_run {
        println!("Dry run: {} not modified", lockfile_path.display());
    } else {
        lockfile
            .write_to_file(lockfile_path)
            .with_context(|| format!("Failed to write {}", lockfile_path.display()))?;
        println!("Updated {}", lockfile_path.display());
    }
    Ok(())
}
