//! Install error taxonomy.
//!
//! Every variant aborts the install; nothing here is retried or rolled back.

use std::io;
use std::path::PathBuf;

use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("download of {url} failed: {source}")]
    DownloadFailure {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("missing source file: {}", .path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("permission denied: {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} already exists{}", .link.display(), existing_suffix(.existing))]
    SymlinkCollision {
        link: PathBuf,
        existing: Option<PathBuf>,
    },

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn existing_suffix(existing: &Option<PathBuf>) -> String {
    match existing {
        Some(target) => format!(" and points to {}", target.display()),
        None => String::new(),
    }
}

impl InstallError {
    /// Map an I/O failure on `path`, lifting permission and not-found errors
    /// into their dedicated variants.
    pub fn from_io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => InstallError::PermissionDenied { path, source },
            io::ErrorKind::NotFound => InstallError::MissingSourceFile { path },
            _ => InstallError::Io {
                action,
                path,
                source,
            },
        }
    }
}
