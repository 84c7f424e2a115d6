//! Content-addressed download cache.
//!
//! Artifacts are stored as `<root>/downloads/<sha256>--<filename>`, so a
//! verified file can be reused by any formula that pins the same digest.

use std::path::{Path, PathBuf};

use crate::checksum::verify_file;
use crate::error::InstallError;
use crate::fetch::{self, FetchOptions};
use crate::formula::Formula;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct DownloadCache {
    root: PathBuf,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Where the artifact for `formula` is (or will be) cached.
    pub fn path_for(&self, formula: &Formula) -> PathBuf {
        self.downloads_dir()
            .join(format!("{}--{}", formula.sha256, formula.artifact_filename()))
    }

    /// Return a verified local copy of the formula's artifact, downloading it
    /// when the cache has no good copy.
    pub fn fetch(
        &self,
        formula: &Formula,
        opts: &FetchOptions,
        policy: &RetryPolicy,
    ) -> Result<PathBuf, InstallError> {
        let path = self.path_for(formula);
        if path.is_file() {
            match verify_file(&path, &formula.sha256) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "using cached download");
                    return Ok(path);
                }
                Err(InstallError::ChecksumMismatch { actual, .. }) => {
                    tracing::warn!(
                        path = %path.display(),
                        actual = %actual,
                        "cached download does not match, fetching again"
                    );
                    std::fs::remove_file(&path)
                        .map_err(|e| InstallError::from_io("remove", &path, e))?;
                }
                Err(e) => return Err(e),
            }
        }

        let dir = self.downloads_dir();
        std::fs::create_dir_all(&dir).map_err(|e| InstallError::from_io("create", &dir, e))?;

        tracing::info!(url = %formula.url, dest = %path.display(), "downloading");
        let bytes = fetch::download(&formula.url, &path, opts, policy).map_err(|source| {
            InstallError::DownloadFailure {
                url: formula.url.clone(),
                source,
            }
        })?;
        tracing::debug!(bytes, "download complete");

        if let Err(e) = verify_file(&path, &formula.sha256) {
            if let Err(rm) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), "could not remove bad download: {}", rm);
            }
            return Err(e);
        }
        Ok(path)
    }
}
