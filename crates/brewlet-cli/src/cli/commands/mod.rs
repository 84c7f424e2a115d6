//! CLI command handlers, one file per command.

mod audit;
mod checksum;
mod completions;
mod fetch;
mod info;
mod install;
mod list;
mod man;
mod uninstall;

pub use audit::run_audit;
pub use checksum::run_checksum;
pub use completions::run_completions;
pub use fetch::run_fetch;
pub use info::run_info;
pub use install::{run_install, InstallArgs};
pub use list::run_list;
pub use man::run_man;
pub use uninstall::run_uninstall;

use anyhow::{Context, Result};
use brewlet_core::cache::DownloadCache;
use brewlet_core::config::BrewletConfig;
use brewlet_core::formula::Formula;
use brewlet_core::installer::{InstallOptions, Installer};
use brewlet_core::keg::LinkConflict;
use brewlet_core::layout::PrefixLayout;
use std::path::Path;

/// Installer over the configured (or overridden) prefix and cache.
fn installer_for(
    cfg: &BrewletConfig,
    prefix: Option<&Path>,
    link_conflict: Option<LinkConflict>,
) -> Result<Installer> {
    let prefix = match prefix {
        Some(p) => p.to_path_buf(),
        None => cfg.resolve_prefix()?,
    };
    let mut options = InstallOptions::from(cfg);
    if let Some(conflict) = link_conflict {
        options.link_conflict = conflict;
    }
    Ok(Installer::new(
        PrefixLayout::new(prefix),
        DownloadCache::new(cfg.resolve_cache_dir()?),
        options,
    ))
}

fn load_formula(path: &Path) -> Result<Formula> {
    Formula::load(path).with_context(|| format!("load formula {}", path.display()))
}
