//! Configuration management for the voicelab CLI.
//!
//! Configuration is stored in ~/.voicelab/config.yaml

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use voicelab_qualitycache::CacheConfig;
use voicelab_voiceid::SignatureConfig;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voicelab";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

const QUALITY_CACHE_FILE: &str = "quality_cache.json";
const LEARNING_STATE_FILE: &str = "learning_state.json";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache invalidation settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Signature bucketing used by `match`.
    #[serde(default)]
    pub signature: SignatureConfig,

    /// Directory holding the cache and learning documents
    /// (default: ~/.voicelab/data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR))
    }

    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Resolves the data directory. Relative overrides are taken relative
    /// to the config file's directory.
    pub fn data_dir(&self) -> PathBuf {
        let base = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.join("data"),
        }
    }

    pub fn quality_cache_path(&self) -> PathBuf {
        self.data_dir().join(QUALITY_CACHE_FILE)
    }

    pub fn learning_state_path(&self) -> PathBuf {
        self.data_dir().join(LEARNING_STATE_FILE)
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}

/// Loads the configuration, creating an empty file on first use.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.cache = cfg.cache.with_defaults();
    cfg.config_path = config_path;
    Ok(cfg)
}
