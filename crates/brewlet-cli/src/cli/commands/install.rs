//! `brewlet install <formula>` – identity check, full pipeline, record the install.

use anyhow::{bail, Context, Result};
use brewlet_core::audit::check_release_identity;
use brewlet_core::config::BrewletConfig;
use brewlet_core::install_db::InstallDb;
use brewlet_core::keg::{LinkAction, LinkConflict};
use std::path::PathBuf;

use super::{installer_for, load_formula};

#[derive(Debug, Clone)]
pub struct InstallArgs {
    pub formula: PathBuf,
    pub prefix: Option<PathBuf>,
    pub overwrite: bool,
    pub dry_run: bool,
}

pub async fn run_install(cfg: &BrewletConfig, db: &InstallDb, args: InstallArgs) -> Result<()> {
    let formula = load_formula(&args.formula)?;
    let known = db.releases().await?;
    check_release_identity(&formula, &known)
        .with_context(|| format!("refusing to install {}", formula.label()))?;

    let conflict = args.overwrite.then_some(LinkConflict::Overwrite);
    let installer = installer_for(cfg, args.prefix.as_deref(), conflict)?;
    let lib_dir = installer.layout().lib_dir(&formula.name, &formula.version);
    if let Some(existing) = db
        .recorded_elsewhere(&formula.name, &formula.version, &lib_dir)
        .await?
    {
        bail!(
            "{} is already installed in {}; uninstall it there first",
            formula.label(),
            existing.lib_dir.display()
        );
    }

    if args.dry_run {
        println!("Would install {} from {}", formula.label(), formula.url);
        for step in installer.plan(&formula) {
            println!("  {step}");
        }
        return Ok(());
    }

    let layout = installer.layout().clone();
    let label = formula.label();
    let report = tokio::task::spawn_blocking(move || installer.install(&formula))
        .await
        .context("install task failed")??;
    db.record_install(&report.record(&layout)).await?;

    println!(
        "Installed {} in {}",
        label,
        layout
            .lib_dir(&report.receipt.name, &report.receipt.version)
            .display()
    );
    for (link, action) in &report.outcome.links {
        let note = match action {
            LinkAction::Created => "",
            LinkAction::Reused => " (unchanged)",
            LinkAction::Replaced => " (replaced)",
        };
        println!("  {} -> {}{}", link.link.display(), link.target.display(), note);
    }
    Ok(())
}
