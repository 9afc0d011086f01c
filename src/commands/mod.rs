// src/commands/mod.rs
//! Command handlers for the revlock CLI

mod fix;
mod update;

pub use fix::cmd_fix_outdated;
pub use update::cmd_update;
