// src/update.rs

//! Lock the newest installable revision of selected tools
//!
//! Unlike the outdated pass this never removes anything: the newest revision
//! is added next to whatever is already locked.

use crate::error::Result;
use crate::lockfile::{normalize_tool_shed_url, Lockfile};
use crate::package::PackageKey;
use crate::toolshed::InstallabilityOracle;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Opens an oracle for a Tool Shed URL
pub type ConnectToolShed<'a> = dyn Fn(&str) -> Result<Box<dyn InstallabilityOracle>> + 'a;

/// Which tools an update applies to
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Any of these owners; empty means every owner
    pub owners: Vec<String>,
    /// Exact repository name
    pub name: Option<String>,
}

impl UpdateFilter {
    pub fn matches(&self, package: &PackageKey) -> bool {
        let owner_ok = self.owners.is_empty() || self.owners.iter().any(|o| *o == package.owner);
        let name_ok = self.name.as_ref().is_none_or(|n| *n == package.name);
        owner_ok && name_ok
    }
}

/// Outcome for one tool that passed the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Newest installable revision was added
    Added(String),
    /// Newest installable revision is already locked
    Current,
    /// The Tool Shed reports nothing installable
    NothingInstallable,
    /// Installable revisions could not be fetched
    Unreachable(String),
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub packages: Vec<(PackageKey, UpdateOutcome)>,
}

impl UpdateReport {
    pub fn added(&self) -> impl Iterator<Item = (&PackageKey, &str)> {
        self.packages.iter().filter_map(|(key, outcome)| match outcome {
            UpdateOutcome::Added(revision) => Some((key, revision.as_str())),
            _ => None,
        })
    }

    pub fn changed(&self) -> bool {
        self.added().next().is_some()
    }
}

/// One oracle per Tool Shed, opened on first use
struct ToolSheds<'a> {
    connect: &'a ConnectToolShed<'a>,
    oracles: HashMap<String, Box<dyn InstallabilityOracle>>,
}

impl<'a> ToolSheds<'a> {
    fn new(connect: &'a ConnectToolShed<'a>) -> Self {
        Self {
            connect,
            oracles: HashMap::new(),
        }
    }

    fn installable_revisions(&mut self, url: &str, package: &PackageKey) -> Result<Vec<String>> {
        let oracle = match self.oracles.entry(normalize_tool_shed_url(url).to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!("Opening Tool Shed {}", url);
                entry.insert((self.connect)(url)?)
            }
        };
        oracle.installable_revisions(package)
    }
}

/// Add the newest installable revision to every matching tool
///
/// Tools without a `tool_shed_url` are looked up on `default_url`; tools
/// pinned to another Tool Shed are looked up there.
pub fn update_lockfile(
    lockfile: &mut Lockfile,
    default_url: &str,
    connect: &ConnectToolShed<'_>,
    filter: &UpdateFilter,
) -> UpdateReport {
    let mut report = UpdateReport::default();
    let mut sheds = ToolSheds::new(connect);

    for tool in &mut lockfile.tools {
        let package = tool.key();
        debug!("Examining {}", package);
        if !filter.matches(&package) {
            continue;
        }

        let url = match &tool.tool_shed_url {
            Some(url) if !tool.endpoint_matches(default_url) => {
                warn!("Non-default Tool Shed URL for {}: {}", package, url);
                url.clone()
            }
            _ => default_url.to_string(),
        };

        info!("Fetching updates for {}", package);
        let outcome = match sheds.installable_revisions(&url, &package) {
            Err(e) => {
                warn!("Could not fetch revisions for {}: {}", package, e);
                UpdateOutcome::Unreachable(e.to_string())
            }
            Ok(revisions) => match revisions.last() {
                None => {
                    warn!("No installable revision of {}", package);
                    UpdateOutcome::NothingInstallable
                }
                Some(latest) => {
                    if tool.lock_revision(latest) {
                        info!("Found newer revision of {} ({})", package, latest);
                        UpdateOutcome::Added(latest.clone())
                    } else {
                        UpdateOutcome::Current
                    }
                }
            },
        };
        report.packages.push((package, outcome));
    }

    report
}
