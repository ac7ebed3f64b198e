//! Betta Configuration
//!
//! Feed tuning and storage location, read once at start.
//! Config file: ~/.config/betta/config.toml or /etc/betta/config.toml
//!
//! ```toml
//! [feed]
//! exp_per_feed = 20
//! cooldown_ms = 1800000
//!
//! [storage]
//! backend = "file"
//! path = "/var/lib/betta/fish_progress.json"
//! ```

use crate::feed::FeedConfig;
use crate::store::ProgressStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the progress file location
pub const PROGRESS_FILE_ENV: &str = "BETTA_PROGRESS_FILE";

/// Progress file name inside the data directory
pub const PROGRESS_FILE_NAME: &str = "fish_progress.json";

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Progress file; defaults to the per-user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Default: <data_local_dir>/betta/fish_progress.json
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("betta")
            .join(PROGRESS_FILE_NAME)
    }

    /// Path actually used: env override, then config, then default
    pub fn resolved_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(PROGRESS_FILE_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        self.path.clone().unwrap_or_else(Self::default_path)
    }
}

/// Main Betta configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BettaConfig {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl BettaConfig {
    /// Get default user config path: ~/.config/betta/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("betta").join("config.toml"))
    }

    /// Get system config path: /etc/betta/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/betta/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/betta/config.toml)
    /// 3. System config (/etc/betta/config.toml)
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: BettaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.exp_per_feed == 0 {
            anyhow::bail!("feed.exp_per_feed must be greater than 0");
        }
        if self.feed.cooldown_ms == 0 {
            anyhow::bail!("feed.cooldown_ms must be greater than 0");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Build the progress store this configuration describes
    pub fn open_store(&self) -> ProgressStore {
        match self.storage.backend {
            BackendKind::File => ProgressStore::open_file(self.storage.resolved_path()),
            BackendKind::Memory => ProgressStore::in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{DEFAULT_EXP_PER_FEED, DEFAULT_FEED_COOLDOWN_MS};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = BettaConfig::default();
        assert_eq!(config.feed.exp_per_feed, DEFAULT_EXP_PER_FEED);
        assert_eq!(config.feed.cooldown_ms, DEFAULT_FEED_COOLDOWN_MS);
        assert_eq!(config.storage.backend, BackendKind::File);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = BettaConfig::parse("[feed]\nexp_per_feed = 15\n").unwrap();
        assert_eq!(config.feed.exp_per_feed, 15);
        assert_eq!(config.feed.cooldown_ms, DEFAULT_FEED_COOLDOWN_MS);
    }

    #[test]
    fn test_parse_storage() {
        let config = BettaConfig::parse(
            "[storage]\nbackend = \"memory\"\npath = \"/tmp/fish.json\"\n",
        )
        .unwrap();
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/fish.json")));
        assert_eq!(config.open_store().describe(), "memory");
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(BettaConfig::parse("[feed]\nexp_per_feed = 0\n").is_err());
        assert!(BettaConfig::parse("[feed]\ncooldown_ms = 0\n").is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(BettaConfig::parse("[storage]\nbackend = \"redis\"\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed]\ncooldown_ms = 60000\n").unwrap();

        let config = BettaConfig::load(Some(&path)).unwrap();
        assert_eq!(config.feed.cooldown_ms, 60_000);

        assert!(BettaConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = BettaConfig::default();
        config.storage.path = Some(PathBuf::from("/srv/betta/progress.json"));
        let text = config.to_toml().unwrap();
        let back = BettaConfig::parse(&text).unwrap();
        assert_eq!(back.storage.path, config.storage.path);
        assert_eq!(back.feed, config.feed);
    }
}
