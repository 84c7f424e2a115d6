//! Download error type for retry classification.

use std::fmt;

/// Error returned by a single download attempt (curl failure, HTTP error, or storage failure).
/// Kept separate from `InstallError` so retries can be decided before it is wrapped.
#[derive(Debug)]
pub enum FetchError {
    /// The URL was rejected before any transfer.
    InvalidUrl(String),
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Transfer completed but fewer bytes were received than announced.
    PartialTransfer { expected: u64, received: u64 },
    /// Disk write failed (e.g. disk full, permission denied). Not retried.
    Storage(std::io::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidUrl(u) => write!(f, "invalid URL: {}", u),
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            FetchError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::InvalidUrl(_) | FetchError::Http(_) | FetchError::PartialTransfer { .. } => {
                None
            }
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}
