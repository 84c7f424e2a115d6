//! `brewlet info <formula>` – print metadata and the install steps.

use anyhow::Result;
use std::path::Path;

use super::load_formula;

pub fn run_info(formula_path: &Path) -> Result<()> {
    let f = load_formula(formula_path)?;
    println!("{}", f.label());
    if !f.desc.is_empty() {
        println!("  {}", f.desc);
    }
    if let Some(homepage) = &f.homepage {
        println!("homepage: {homepage}");
    }
    println!("url:      {}", f.url);
    println!("sha256:   {}", f.sha256);
    println!("artifact: {}", f.artifact_filename());
    let commands: Vec<String> = f
        .command_names()
        .iter()
        .map(|c| c.display().to_string())
        .collect();
    if !commands.is_empty() {
        println!("commands: {}", commands.join(", "));
    }
    println!("steps:");
    for (i, step) in f.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    Ok(())
}
