// src/cli/mod.rs
//! CLI definitions for revlock
//!
//! The command implementations are in the `commands` module.

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "revlock")]
#[command(version)]
#[command(about = "Keep tool lockfiles installable against a Tool Shed", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/revlock/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true, value_enum)]
    pub log: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace locked revisions that are no longer installable
    ///
    /// Each non-installable revision is swapped for the next installable
    /// revision in history, but only if both define the same tool versions.
    /// Only the lockfile is changed; nothing is installed or uninstalled.
    FixOutdated {
        /// Lockfile to reconcile (e.g. tools.yaml.lock)
        lockfile: PathBuf,

        /// Tool Shed to check against
        #[arg(long)]
        toolshed: Option<String>,

        /// Galaxy server whose installed revisions must stay locked
        #[arg(long)]
        galaxy_url: Option<String>,

        /// Report changes without rewriting the lockfile
        #[arg(long)]
        dry_run: bool,
    },

    /// Lock the newest installable revision of matching tools
    Update {
        /// Lockfile to update
        lockfile: PathBuf,

        /// Repository owner to filter on (can be given multiple times)
        #[arg(long)]
        owner: Vec<String>,

        /// Repository name to filter on
        #[arg(long)]
        name: Option<String>,

        /// Tool Shed to query
        #[arg(long)]
        toolshed: Option<String>,

        /// Report changes without rewriting the lockfile
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}
