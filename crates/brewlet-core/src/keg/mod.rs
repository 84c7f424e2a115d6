//! Keg installation: replay a formula's steps into `lib_dir` and `bin_dir`.
//!
//! Steps run strictly in order. The first failing step aborts the install and
//! whatever earlier steps wrote stays in place; cleanup is the caller's call.

mod steps;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::formula::{Formula, InstallStep};
use crate::fs::InstallFs;
use crate::layout::PrefixLayout;

/// What to do when the link path is already taken by something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkConflict {
    #[default]
    Fail,
    Overwrite,
}

/// Directories a formula's steps are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    /// Working directory holding the verified payload.
    pub staging_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub bin_dir: PathBuf,
}

impl InstallContext {
    pub fn for_formula(formula: &Formula, layout: &PrefixLayout, staging_dir: &Path) -> Self {
        Self {
            staging_dir: staging_dir.to_path_buf(),
            lib_dir: layout.lib_dir(&formula.name, &formula.version),
            bin_dir: layout.bin_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAction {
    Created,
    /// The link already pointed at the target.
    Reused,
    /// Something else was there and got replaced.
    Replaced,
}

/// Everything one install run did, in step order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub files: Vec<PathBuf>,
    pub modes: Vec<(PathBuf, u32)>,
    pub links: Vec<(LinkRecord, LinkAction)>,
}

/// A step resolved to absolute paths, for dry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedStep {
    CopyAll { pattern: PathBuf, destination: PathBuf },
    SetExecutable { path: PathBuf, mode: u32 },
    CreateSymlink { link: PathBuf, target: PathBuf },
}

impl std::fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannedStep::CopyAll {
                pattern,
                destination,
            } => write!(f, "copy {} -> {}", pattern.display(), destination.display()),
            PlannedStep::SetExecutable { path, mode } => {
                write!(f, "chmod {:04o} {}", mode, path.display())
            }
            PlannedStep::CreateSymlink { link, target } => {
                write!(f, "link {} -> {}", link.display(), target.display())
            }
        }
    }
}

/// Resolve every step against `ctx` without touching any filesystem.
pub fn plan(formula: &Formula, ctx: &InstallContext) -> Vec<PlannedStep> {
    formula
        .steps
        .iter()
        .map(|step| match step {
            InstallStep::CopyAll {
                source,
                destination,
            } => PlannedStep::CopyAll {
                pattern: ctx.staging_dir.join(source),
                destination: ctx.lib_dir.join(destination),
            },
            InstallStep::SetExecutable { path, mode } => PlannedStep::SetExecutable {
                path: ctx.lib_dir.join(path),
                mode: mode.bits(),
            },
            InstallStep::CreateSymlink { target, link } => PlannedStep::CreateSymlink {
                link: ctx.bin_dir.join(link),
                target: ctx.lib_dir.join(target),
            },
        })
        .collect()
}

/// Run the formula's steps in order against `fs`.
pub fn install(
    formula: &Formula,
    ctx: &InstallContext,
    fs: &dyn InstallFs,
    link_conflict: LinkConflict,
) -> Result<InstallOutcome, InstallError> {
    let mut outcome = InstallOutcome::default();
    tracing::info!(
        formula = %formula.label(),
        lib_dir = %ctx.lib_dir.display(),
        "installing"
    );
    for (index, step) in formula.steps.iter().enumerate() {
        tracing::debug!(index, step = %step, "running install step");
        steps::apply(step, ctx, fs, link_conflict, &mut outcome).map_err(|e| {
            tracing::warn!(index, step = %step, "install step failed: {}", e);
            e
        })?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests;
