//! `brewlet checksum <path>` – print the SHA-256 to pin in a formula.

use anyhow::Result;
use brewlet_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
