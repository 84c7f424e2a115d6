//! The install pipeline: fetch, verify, stage, run steps, write the receipt.
//!
//! Everything here blocks; async callers run it inside `spawn_blocking`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cache::DownloadCache;
use crate::config::BrewletConfig;
use crate::error::InstallError;
use crate::fetch::FetchOptions;
use crate::formula::Formula;
use crate::fs::{resolve_link, EntryKind, InstallFs, RealFs};
use crate::install_db::{unix_timestamp, InstallRecord};
use crate::keg::{self, InstallContext, InstallOutcome, LinkConflict, PlannedStep};
use crate::layout::PrefixLayout;
use crate::receipt::InstallReceipt;
use crate::retry::RetryPolicy;
use crate::stage;

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub fetch: FetchOptions,
    pub retry: RetryPolicy,
    pub link_conflict: LinkConflict,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            retry: RetryPolicy::default(),
            link_conflict: LinkConflict::Fail,
        }
    }
}

impl From<&BrewletConfig> for InstallOptions {
    fn from(cfg: &BrewletConfig) -> Self {
        Self {
            fetch: FetchOptions::from(cfg),
            retry: cfg.retry_policy(),
            link_conflict: cfg.link_conflict,
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub download: PathBuf,
    pub outcome: InstallOutcome,
    pub receipt: InstallReceipt,
    pub receipt_path: PathBuf,
}

impl InstallReport {
    /// Row for the install database.
    pub fn record(&self, layout: &PrefixLayout) -> InstallRecord {
        InstallRecord {
            name: self.receipt.name.clone(),
            version: self.receipt.version.clone(),
            url: self.receipt.url.clone(),
            sha256: self.receipt.sha256.clone(),
            lib_dir: layout.lib_dir(&self.receipt.name, &self.receipt.version),
            installed_at: self.receipt.installed_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed_links: Vec<PathBuf>,
    /// Links from the receipt that now point elsewhere (or are gone).
    pub skipped_links: Vec<PathBuf>,
    pub lib_dir_removed: bool,
    pub package_dir_removed: bool,
}

pub struct Installer {
    layout: PrefixLayout,
    cache: DownloadCache,
    options: InstallOptions,
}

impl Installer {
    pub fn new(layout: PrefixLayout, cache: DownloadCache, options: InstallOptions) -> Self {
        Self {
            layout,
            cache,
            options,
        }
    }

    pub fn layout(&self) -> &PrefixLayout {
        &self.layout
    }

    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }

    /// Download (or reuse) and verify the artifact.
    pub fn fetch(&self, formula: &Formula) -> Result<PathBuf, InstallError> {
        self.cache
            .fetch(formula, &self.options.fetch, &self.options.retry)
    }

    /// Steps resolved against this prefix, without touching anything.
    pub fn plan(&self, formula: &Formula) -> Vec<PlannedStep> {
        let staging = self.staging_parent().join(format!("<{}>", formula.artifact_filename()));
        let ctx = InstallContext::for_formula(formula, &self.layout, &staging);
        keg::plan(formula, &ctx)
    }

    /// Full pipeline. Steps only run once the artifact is verified; a failing
    /// step leaves earlier steps' output in place.
    pub fn install(&self, formula: &Formula) -> Result<InstallReport> {
        let download = self.fetch(formula)?;
        let staged = stage::stage(formula, &download, Some(&self.staging_parent()))?;

        let ctx = InstallContext::for_formula(formula, &self.layout, staged.dir());
        let outcome = keg::install(formula, &ctx, &RealFs, self.options.link_conflict)?;

        std::fs::create_dir_all(&ctx.lib_dir)
            .with_context(|| format!("create {}", ctx.lib_dir.display()))?;
        let fresh = InstallReceipt::new(formula, &outcome, unix_timestamp());
        // An unchanged reinstall keeps the receipt (and its timestamp) as is.
        let (receipt, receipt_path) =
            match InstallReceipt::load(&self.layout, &formula.name, &formula.version) {
                Ok(Some(existing)) if existing.same_install(&fresh) => {
                    let path = self.layout.receipt_path(&formula.name, &formula.version);
                    (existing, path)
                }
                _ => {
                    let path = fresh.write(&self.layout)?;
                    (fresh, path)
                }
            };
        tracing::info!(
            formula = %formula.label(),
            files = outcome.files.len(),
            links = outcome.links.len(),
            receipt = %receipt_path.display(),
            "installed"
        );
        Ok(InstallReport {
            download,
            outcome,
            receipt,
            receipt_path,
        })
    }

    pub fn uninstall(&self, receipt: &InstallReceipt) -> Result<UninstallReport> {
        uninstall_with(&RealFs, &self.layout, receipt)
    }

    fn staging_parent(&self) -> PathBuf {
        self.cache.root().join("staging")
    }
}

/// Remove a keg described by `receipt`: links that still point into the keg,
/// then the keg itself, then the package dir if nothing else is left in it.
pub fn uninstall_with(
    fs: &dyn InstallFs,
    layout: &PrefixLayout,
    receipt: &InstallReceipt,
) -> Result<UninstallReport> {
    let lib_dir = layout.lib_dir(&receipt.name, &receipt.version);
    let mut report = UninstallReport::default();

    for record in &receipt.links {
        if points_into(fs, &record.link, &lib_dir) {
            fs.remove_file(&record.link)
                .with_context(|| format!("remove link {}", record.link.display()))?;
            tracing::debug!(link = %record.link.display(), "link removed");
            report.removed_links.push(record.link.clone());
        } else {
            tracing::debug!(link = %record.link.display(), "link no longer ours, leaving it");
            report.skipped_links.push(record.link.clone());
        }
    }

    if fs.entry(&lib_dir).is_some() {
        fs.remove_dir_all(&lib_dir)
            .with_context(|| format!("remove {}", lib_dir.display()))?;
        report.lib_dir_removed = true;
    }

    let package_dir = layout.package_dir(&receipt.name);
    if matches!(fs.entry(&package_dir), Some(EntryKind::Dir)) {
        report.package_dir_removed = fs
            .remove_dir_if_empty(&package_dir)
            .with_context(|| format!("remove {}", package_dir.display()))?;
    }
    tracing::info!(
        formula = %format!("{}@{}", receipt.name, receipt.version),
        removed_links = report.removed_links.len(),
        "uninstalled"
    );
    Ok(report)
}

fn points_into(fs: &dyn InstallFs, link: &Path, lib_dir: &Path) -> bool {
    match fs.entry(link) {
        Some(EntryKind::Symlink(raw)) => resolve_link(link, &raw).starts_with(lib_dir),
        _ => false,
    }
}
