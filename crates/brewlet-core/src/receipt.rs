//! `INSTALL_RECEIPT.json`: what an install put on disk.
//!
//! Written into the keg after the last step succeeds; `uninstall` reads it
//! back to know which links belong to the keg.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::formula::Formula;
use crate::keg::{InstallOutcome, LinkRecord};
use crate::layout::PrefixLayout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRecord {
    pub path: PathBuf,
    /// Octal string, e.g. `"0755"`.
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
    /// Unix seconds.
    pub installed_at: i64,
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub modes: Vec<ModeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl InstallReceipt {
    pub fn new(formula: &Formula, outcome: &InstallOutcome, installed_at: i64) -> Self {
        Self {
            name: formula.name.clone(),
            version: formula.version.clone(),
            url: formula.url.clone(),
            sha256: formula.sha256.to_string(),
            installed_at,
            files: outcome.files.clone(),
            modes: outcome
                .modes
                .iter()
                .map(|(path, mode)| ModeRecord {
                    path: path.clone(),
                    mode: format!("{:04o}", mode),
                })
                .collect(),
            links: outcome.links.iter().map(|(record, _)| record.clone()).collect(),
        }
    }

    /// Same install apart from when it happened.
    pub fn same_install(&self, other: &Self) -> bool {
        let mut this = self.clone();
        this.installed_at = other.installed_at;
        this == *other
    }

    /// Write to `layout.receipt_path(name, version)` via a temp file and rename.
    pub fn write(&self, layout: &PrefixLayout) -> Result<PathBuf> {
        let path = layout.receipt_path(&self.name, &self.version);
        let json = serde_json::to_string_pretty(self).context("serialize install receipt")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read install receipt {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse install receipt {}", path.display()))
    }

    /// Receipt for an installed version, if there is one.
    pub fn load(layout: &PrefixLayout, name: &str, version: &str) -> Result<Option<Self>> {
        let path = layout.receipt_path(name, version);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    /// Versions of `name` with a receipt under the prefix, sorted.
    pub fn installed_versions(layout: &PrefixLayout, name: &str) -> Result<Vec<String>> {
        let dir = layout.package_dir(name);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("list {}", dir.display())),
        };
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", dir.display()))?;
            let version = entry.file_name().to_string_lossy().into_owned();
            if layout.receipt_path(name, &version).is_file() {
                versions.push(version);
            }
        }
        versions.sort();
        Ok(versions)
    }
}
