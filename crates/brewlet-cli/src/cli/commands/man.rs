//! `brewlet man <dir>` – render `brewlet.1` plus one page per subcommand.

use anyhow::{Context, Result};
use clap::CommandFactory;
use std::path::Path;

fn render(cmd: clap::Command, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut buf)
        .context("man page render failed")?;
    std::fs::write(path, &buf).with_context(|| format!("write {}", path.display()))
}

pub fn run_man<C: CommandFactory>(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let cmd = C::command();
    render(cmd.clone(), &dir.join("brewlet.1"))?;
    for sub in cmd.get_subcommands() {
        let name = format!("brewlet-{}", sub.get_name());
        render(sub.clone(), &dir.join(format!("{name}.1")))?;
    }
    println!("man pages written to {}", dir.display());
    Ok(())
}
