use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::keg::LinkConflict;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of download attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/brewlet/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrewletConfig {
    /// Install prefix holding `lib/` and `bin/`. Defaults to `~/.local/share/brewlet`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<PathBuf>,
    /// Download cache. Defaults to `~/.cache/brewlet`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// What to do when `bin/<name>` already exists and points elsewhere.
    #[serde(default)]
    pub link_conflict: LinkConflict,
    /// Connect timeout for downloads, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Optional download bandwidth cap in bytes per second (None = no cap).
    #[serde(default)]
    pub max_bytes_per_sec: Option<u64>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for BrewletConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            cache_dir: None,
            link_conflict: LinkConflict::Fail,
            connect_timeout_secs: default_connect_timeout_secs(),
            max_bytes_per_sec: None,
            retry: None,
        }
    }
}

impl BrewletConfig {
    /// Configured prefix, or the XDG data home default.
    pub fn resolve_prefix(&self) -> Result<PathBuf> {
        match &self.prefix {
            Some(p) => Ok(p.clone()),
            None => Ok(xdg::BaseDirectories::with_prefix("brewlet")?.get_data_home()),
        }
    }

    /// Configured cache dir, or the XDG cache home default.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(p) => Ok(p.clone()),
            None => Ok(xdg::BaseDirectories::with_prefix("brewlet")?.get_cache_home()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("brewlet")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BrewletConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<BrewletConfig> {
    if !path.exists() {
        let default_cfg = BrewletConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: BrewletConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_values() {
        let cfg = BrewletConfig::default();
        assert!(cfg.prefix.is_none());
        assert!(cfg.cache_dir.is_none());
        assert_eq!(cfg.link_conflict, LinkConflict::Fail);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BrewletConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BrewletConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.connect_timeout_secs, cfg.connect_timeout_secs);
        assert_eq!(parsed.link_conflict, cfg.link_conflict);
        assert!(parsed.prefix.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            prefix = "/opt/brewlet"
            cache_dir = "/var/cache/brewlet"
            link_conflict = "overwrite"
            connect_timeout_secs = 5
            max_bytes_per_sec = 1_000_000

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: BrewletConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.resolve_prefix().unwrap(), PathBuf::from("/opt/brewlet"));
        assert_eq!(
            cfg.resolve_cache_dir().unwrap(),
            PathBuf::from("/var/cache/brewlet")
        );
        assert_eq!(cfg.link_conflict, LinkConflict::Overwrite);
        assert_eq!(cfg.max_bytes_per_sec, Some(1_000_000));
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(15));
    }

    #[test]
    fn missing_link_conflict_defaults_to_fail() {
        let cfg: BrewletConfig = toml::from_str("connect_timeout_secs = 10").unwrap();
        assert_eq!(cfg.link_conflict, LinkConflict::Fail);
        assert_eq!(cfg.retry_policy().max_attempts, 5);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: BrewletConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert!(cfg.max_bytes_per_sec.is_none());
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.connect_timeout_secs, 30);

        fs::write(&path, "connect_timeout_secs = 7\nlink_conflict = \"overwrite\"\n").unwrap();
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg.connect_timeout_secs, 7);
        assert_eq!(cfg.link_conflict, LinkConflict::Overwrite);
    }
}
