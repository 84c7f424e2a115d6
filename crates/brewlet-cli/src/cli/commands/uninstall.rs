//! `brewlet uninstall <name> [--version V]` – remove kegs, their links and DB rows.

use anyhow::{bail, Result};
use brewlet_core::config::BrewletConfig;
use brewlet_core::install_db::{InstallDb, InstallRecord};
use brewlet_core::receipt::InstallReceipt;
use std::path::{Path, PathBuf};

use super::installer_for;

pub async fn run_uninstall(
    cfg: &BrewletConfig,
    db: &InstallDb,
    name: &str,
    version: Option<&str>,
    prefix: Option<&Path>,
) -> Result<()> {
    let records: Vec<InstallRecord> = match version {
        Some(v) => db.get_install(name, v).await?.into_iter().collect(),
        None => db.installs_of(name).await?,
    };

    // Each version is removed from its own prefix: flag, then where that
    // version was recorded, then config.
    let mut targets: Vec<(String, Option<PathBuf>)> = records
        .iter()
        .map(|r| (r.version.clone(), prefix.map(Path::to_path_buf).or_else(|| r.prefix())))
        .collect();
    if targets.is_empty() {
        let fallback = prefix.map(Path::to_path_buf);
        let versions = match version {
            Some(v) => vec![v.to_string()],
            None => {
                let installer = installer_for(cfg, fallback.as_deref(), None)?;
                InstallReceipt::installed_versions(installer.layout(), name)?
            }
        };
        targets = versions.into_iter().map(|v| (v, fallback.clone())).collect();
    }

    let mut removed = 0;
    for (v, target_prefix) in &targets {
        let installer = installer_for(cfg, target_prefix.as_deref(), None)?;
        let had_receipt = match InstallReceipt::load(installer.layout(), name, v)? {
            Some(receipt) => {
                let report = installer.uninstall(&receipt)?;
                for link in &report.skipped_links {
                    println!("  left {} (no longer points into {name}@{v})", link.display());
                }
                true
            }
            None => {
                tracing::warn!(
                    name,
                    version = %v,
                    prefix = %installer.layout().root().display(),
                    "no install receipt, only forgetting the record"
                );
                false
            }
        };
        let had_row = db.remove_install(name, v).await?;
        if had_receipt || had_row {
            println!("Uninstalled {name}@{v}");
            removed += 1;
        }
    }

    if removed == 0 {
        bail!("{} is not installed", name);
    }
    Ok(())
}
