//! `brewlet fetch <formula>` – download and verify into the cache only.

use anyhow::{Context, Result};
use brewlet_core::config::BrewletConfig;
use std::path::Path;

use super::{installer_for, load_formula};

pub async fn run_fetch(cfg: &BrewletConfig, formula_path: &Path) -> Result<()> {
    let formula = load_formula(formula_path)?;
    let installer = installer_for(cfg, None, None)?;
    let label = formula.label();
    let path = tokio::task::spawn_blocking(move || installer.fetch(&formula))
        .await
        .context("fetch task failed")??;
    println!("{}: {}", label, path.display());
    Ok(())
}
