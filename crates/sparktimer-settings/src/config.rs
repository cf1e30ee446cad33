//! Configuration and settings management for SparkTimer
//!
//! Supports JSON and TOML file formats. The default location is
//! `<config dir>/sparktimer/config.toml`.
//!
//! Configuration is organized into logical sections:
//! - Estimation settings (which time policy is active)
//! - Preview settings (layer cache, export directory, initial layer)

pub use sparktimer_core::units::{EstimationPolicy, DEFAULT_LAYER_OVERHEAD_SECS};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Print-time estimation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationSettings {
    /// Active estimation policy
    #[serde(default)]
    pub policy: EstimationPolicy,
    /// Seconds added per dwell command under `layer_overhead`
    #[serde(default = "default_layer_overhead")]
    pub layer_overhead_secs: f64,
}

fn default_layer_overhead() -> f64 {
    DEFAULT_LAYER_OVERHEAD_SECS
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            policy: EstimationPolicy::default(),
            layer_overhead_secs: DEFAULT_LAYER_OVERHEAD_SECS,
        }
    }
}

/// Layer preview settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Keep decoded layers in memory between requests
    #[serde(default)]
    pub cache_layers: bool,
    /// Directory exported layer images are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// 1-based layer shown right after a file is loaded
    #[serde(default = "default_initial_layer")]
    pub initial_layer: usize,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_initial_layer() -> usize {
    1
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            cache_layers: false,
            export_dir: default_export_dir(),
            initial_layer: default_initial_layer(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Estimation settings
    #[serde(default)]
    pub estimation: EstimationSettings,
    /// Preview settings
    #[serde(default)]
    pub preview: PreviewSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform default config file path
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("sparktimer").join("config.toml"))
            .ok_or_else(|| {
                ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()).into()
            })
    }

    /// Load the config at `path`, or the default path when `None`
    ///
    /// A missing file yields defaults; a present but invalid file is an error.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!("No default config location: {}", e);
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            tracing::debug!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from_file(&path)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let overhead = self.estimation.layer_overhead_secs;
        if !overhead.is_finite() || overhead < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "estimation.layer_overhead_secs".to_string(),
                value: overhead.to_string(),
            });
        }

        if self.preview.initial_layer == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "preview.initial_layer".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
