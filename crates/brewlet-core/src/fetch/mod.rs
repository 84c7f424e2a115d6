//! Single-stream artifact download over libcurl.
//!
//! The body is written sequentially to `<dest>.part`, then synced and renamed
//! to `<dest>`. Transient failures are retried according to a `RetryPolicy`.

mod error;
mod part;

pub use error::FetchError;
pub use part::{temp_path, PartFile, TEMP_SUFFIX};

use crate::config::BrewletConfig;
use crate::retry::{run_with_retry, RetryPolicy};
use std::path::Path;
use std::time::Duration;

/// Transfer knobs taken from config.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Receive speed cap in bytes per second.
    pub max_recv_speed: Option<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            max_recv_speed: None,
        }
    }
}

impl From<&BrewletConfig> for FetchOptions {
    fn from(cfg: &BrewletConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs.max(1)),
            max_recv_speed: cfg.max_bytes_per_sec,
        }
    }
}

/// Downloads `url` to `dest`, retrying transient failures. Returns the number of bytes written.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn download(
    url: &str,
    dest: &Path,
    opts: &FetchOptions,
    policy: &RetryPolicy,
) -> Result<u64, FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    let check_status = matches!(parsed.scheme(), "http" | "https");
    run_with_retry(policy, |attempt| {
        tracing::debug!(url, attempt, dest = %dest.display(), "download attempt");
        download_once(url, dest, opts, check_status)
    })
}

fn download_once(
    url: &str,
    dest: &Path,
    opts: &FetchOptions,
    check_status: bool,
) -> Result<u64, FetchError> {
    let mut part = PartFile::create(dest).map_err(FetchError::Storage)?;
    match transfer(url, &mut part, opts, check_status) {
        Ok(()) => {
            let written = part.written();
            part.finalize(dest).map_err(FetchError::Storage)?;
            Ok(written)
        }
        Err(e) => {
            part.discard();
            Err(e)
        }
    }
}

fn transfer(
    url: &str,
    part: &mut PartFile,
    opts: &FetchOptions,
    check_status: bool,
) -> Result<(), FetchError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    if let Some(speed) = opts.max_recv_speed {
        easy.max_recv_speed(speed)?;
    }
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(Duration::from_secs(3600))?;
    easy.fail_on_error(false)?;

    let mut write_err: Option<std::io::Error> = None;
    let perform = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match part.write(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                tracing::warn!("download write failed: {}", e);
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_err {
        return Err(FetchError::Storage(e));
    }
    perform?;

    if check_status {
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
    }

    let expected = easy.content_length_download()?;
    if expected >= 0.0 {
        let expected = expected as u64;
        if part.written() != expected {
            return Err(FetchError::PartialTransfer {
                expected,
                received: part.written(),
            });
        }
    }
    Ok(())
}
