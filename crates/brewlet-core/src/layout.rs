//! Prefix layout: where kegs, links and receipts live.
//!
//! ```text
//! <prefix>/
//!   bin/<command>                   -> ../lib/<name>/<version>/<binary>
//!   lib/<name>/<version>/<payload>
//!   lib/<name>/<version>/INSTALL_RECEIPT.json
//! ```

use std::path::{Path, PathBuf};

pub const RECEIPT_FILENAME: &str = "INSTALL_RECEIPT.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    root: PathBuf,
}

impl PrefixLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lib_root(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// All installed versions of a package live here.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.lib_root().join(name)
    }

    /// The keg: one installed version of one package.
    pub fn lib_dir(&self, name: &str, version: &str) -> PathBuf {
        self.package_dir(name).join(version)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn receipt_path(&self, name: &str, version: &str) -> PathBuf {
        self.lib_dir(name, version).join(RECEIPT_FILENAME)
    }
}
