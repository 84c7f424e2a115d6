//! `brewlet list` – installed packages from the install database.

use anyhow::Result;
use brewlet_core::install_db::InstallDb;

pub async fn run_list(db: &InstallDb) -> Result<()> {
    let installs = db.list_installs().await?;
    if installs.is_empty() {
        println!("Nothing installed.");
        return Ok(());
    }
    println!("{:<24} {:<12} {:<12} {}", "NAME", "VERSION", "INSTALLED", "LOCATION");
    for i in installs {
        println!(
            "{:<24} {:<12} {:<12} {}",
            i.name,
            i.version,
            i.installed_at,
            i.lib_dir.display()
        );
    }
    Ok(())
}
