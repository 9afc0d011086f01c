// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Noisy dependencies are clamped regardless of the requested level
const QUIET_TARGETS: &str = "reqwest=warn,hyper=warn,rustls=warn";

fn init_logging(level: Option<cli::LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!("{level},{QUIET_TARGETS}")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_TARGETS}"))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log);

    let mut config = revlock::Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::FixOutdated {
            lockfile,
            toolshed,
            galaxy_url,
            dry_run,
        } => {
            if let Some(url) = toolshed {
                config.toolshed_url = url;
            }
            if galaxy_url.is_some() {
                config.galaxy_url = galaxy_url;
            }
            commands::cmd_fix_outdated(&config, &lockfile, dry_run)
        }
        Commands::Update {
            lockfile,
            owner,
            name,
            toolshed,
            dry_run,
        } => {
            if let Some(url) = toolshed {
                config.toolshed_url = url;
            }
            let filter = revlock::UpdateFilter { owners: owner, name };
            commands::cmd_update(&config, &lockfile, &filter, dry_run)
        }
    }
}
