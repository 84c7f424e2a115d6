//! Types stored in the install database.

use std::path::{Path, PathBuf};

use crate::audit::Release;

/// One installed version of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRecord {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
    pub lib_dir: PathBuf,
    /// Unix seconds.
    pub installed_at: i64,
}

impl InstallRecord {
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// `<prefix>/lib/<name>/<version>` -> `<prefix>`.
    pub fn prefix(&self) -> Option<PathBuf> {
        self.lib_dir.ancestors().nth(3).map(Path::to_path_buf)
    }

    pub fn release(&self) -> Release {
        Release {
            name: self.name.clone(),
            version: self.version.clone(),
            url: self.url.clone(),
            sha256: self.sha256.clone(),
        }
    }
}
