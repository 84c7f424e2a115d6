//! `brewlet audit <formula>...` – parse/validate each file, then check release
//! identity across the set and against recorded installs.

use anyhow::{bail, Result};
use brewlet_core::audit::{audit_formulae, check_release_identity};
use brewlet_core::formula::Formula;
use brewlet_core::install_db::InstallDb;
use std::path::PathBuf;

pub async fn run_audit(db: Option<&InstallDb>, paths: &[PathBuf]) -> Result<()> {
    let mut problems = 0usize;
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match Formula::load(path) {
            Ok(f) => {
                println!("ok     {} ({})", path.display(), f.label());
                loaded.push(f);
            }
            Err(e) => {
                println!("error  {}: {}", path.display(), e);
                problems += 1;
            }
        }
    }

    for conflict in audit_formulae(&loaded) {
        println!("error  {conflict}");
        problems += 1;
    }

    if let Some(db) = db {
        let known = db.releases().await?;
        for f in &loaded {
            if let Err(conflict) = check_release_identity(f, &known) {
                println!("error  {conflict} (install history)");
                problems += 1;
            }
        }
    }

    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    println!("{} formula(e) checked, no problems", loaded.len());
    Ok(())
}
