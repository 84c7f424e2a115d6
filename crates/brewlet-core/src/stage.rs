//! Scratch directory holding the verified payload while steps run.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::formula::Formula;

/// A temporary staging directory; removed when dropped.
#[derive(Debug)]
pub struct StagedPayload {
    dir: tempfile::TempDir,
    artifact: PathBuf,
}

impl StagedPayload {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// The artifact inside the staging directory.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

/// Copy the verified download into a fresh staging directory under the
/// formula's artifact filename. `parent` defaults to the system temp dir.
pub fn stage(formula: &Formula, download: &Path, parent: Option<&Path>) -> Result<StagedPayload> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("brewlet-stage-");
    let dir = match parent {
        Some(parent) => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
            builder.tempdir_in(parent)
        }
        None => builder.tempdir(),
    }
    .context("create staging directory")?;

    let artifact = dir.path().join(formula.artifact_filename());
    std::fs::copy(download, &artifact)
        .with_context(|| format!("stage {} -> {}", download.display(), artifact.display()))?;
    tracing::debug!(staging = %dir.path().display(), artifact = %artifact.display(), "payload staged");
    Ok(StagedPayload { dir, artifact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::fixtures::{single_binary, PYGMY_SHA256};

    #[test]
    fn stages_under_url_filename_and_cleans_up() {
        let work = tempfile::tempdir().unwrap();
        let download = work.path().join(format!("{PYGMY_SHA256}--pygmy-go-darwin"));
        std::fs::write(&download, b"payload").unwrap();
        let formula = single_binary(
            "pygmy-go",
            "v0.2.0",
            "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.0/pygmy-go-darwin",
            PYGMY_SHA256,
            "pygmy-go-darwin",
            "pygmy",
        );

        let staged = stage(&formula, &download, Some(&work.path().join("tmp"))).unwrap();
        let dir = staged.dir().to_path_buf();
        assert!(dir.starts_with(work.path().join("tmp")));
        assert_eq!(staged.artifact(), dir.join("pygmy-go-darwin"));
        assert_eq!(std::fs::read(staged.artifact()).unwrap(), b"payload");

        drop(staged);
        assert!(!dir.exists());
        // The cached download is untouched.
        assert!(download.exists());
    }

    #[test]
    fn missing_download_is_an_error() {
        let work = tempfile::tempdir().unwrap();
        let formula = single_binary(
            "t",
            "1",
            "https://example.com/t",
            PYGMY_SHA256,
            "t",
            "t",
        );
        assert!(stage(&formula, &work.path().join("nope"), None).is_err());
    }
}
