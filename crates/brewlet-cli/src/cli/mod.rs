//! CLI for the brewlet formula installer.

mod commands;

use anyhow::Result;
use brewlet_core::config;
use brewlet_core::install_db::InstallDb;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{
    run_audit, run_checksum, run_completions, run_fetch, run_info, run_install, run_list,
    run_man, run_uninstall, InstallArgs,
};

/// Top-level CLI for brewlet.
#[derive(Debug, Parser)]
#[command(name = "brewlet")]
#[command(about = "brewlet: install prebuilt binaries from declarative formulae", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download, verify and install a formula.
    Install {
        /// Path to the formula TOML file.
        formula: PathBuf,

        /// Install under this prefix instead of the configured one.
        #[arg(long, value_name = "DIR")]
        prefix: Option<PathBuf>,

        /// Replace links in bin/ that belong to something else.
        #[arg(long)]
        overwrite: bool,

        /// Print the resolved install steps and exit.
        #[arg(long)]
        dry_run: bool,
    },

    /// Download and verify a formula's artifact into the cache only.
    Fetch {
        /// Path to the formula TOML file.
        formula: PathBuf,
    },

    /// Remove an installed package (all versions unless --version is given).
    Uninstall {
        name: String,

        #[arg(long)]
        version: Option<String>,

        /// Prefix the package was installed under, if not recorded.
        #[arg(long, value_name = "DIR")]
        prefix: Option<PathBuf>,
    },

    /// List installed packages.
    List,

    /// Show a formula's metadata and install steps.
    Info {
        formula: PathBuf,
    },

    /// Validate formula files and check release identity across them.
    Audit {
        #[arg(required = true)]
        formulae: Vec<PathBuf>,

        /// Skip the comparison against recorded installs.
        #[arg(long)]
        no_history: bool,
    },

    /// Compute SHA-256 of a file (e.g. a release artifact for a new formula).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions.
    Completions {
        shell: Shell,
    },

    /// Write man pages into a directory.
    Man {
        dir: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        cli.command.run().await
    }

    async fn run(self) -> Result<()> {
        match self {
            CliCommand::Install {
                formula,
                prefix,
                overwrite,
                dry_run,
            } => {
                let cfg = load_config()?;
                let db = InstallDb::open_default().await?;
                let args = InstallArgs {
                    formula,
                    prefix,
                    overwrite,
                    dry_run,
                };
                run_install(&cfg, &db, args).await?;
            }
            CliCommand::Fetch { formula } => run_fetch(&load_config()?, &formula).await?,
            CliCommand::Uninstall {
                name,
                version,
                prefix,
            } => {
                let cfg = load_config()?;
                let db = InstallDb::open_default().await?;
                run_uninstall(&cfg, &db, &name, version.as_deref(), prefix.as_deref()).await?;
            }
            CliCommand::List => {
                let db = InstallDb::open_default().await?;
                run_list(&db).await?;
            }
            CliCommand::Info { formula } => run_info(&formula)?,
            CliCommand::Audit {
                formulae,
                no_history,
            } => {
                let db = if no_history {
                    None
                } else {
                    Some(InstallDb::open_default().await?)
                };
                run_audit(db.as_ref(), &formulae).await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Completions { shell } => run_completions::<Cli>(shell)?,
            CliCommand::Man { dir } => run_man::<Cli>(&dir)?,
        }

        Ok(())
    }
}

fn load_config() -> Result<config::BrewletConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
