use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{KinsealError, KinsealResult};

/// Top-level configuration (loaded from kinseal.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KinsealConfig {
    pub key: KeyConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl KinsealConfig {
    /// Parse a TOML document; missing sections and fields take their defaults.
    pub fn from_toml_str(content: &str) -> KinsealResult<Self> {
        toml::from_str(content).map_err(|e| KinsealError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> KinsealResult<String> {
        toml::to_string_pretty(self).map_err(|e| KinsealError::Config(e.to_string()))
    }
}

/// Where the sealing key lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Base64 key file written by `kinseal keygen`
    pub file: PathBuf,
    /// Environment variable checked before the key file
    pub env_var: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension appended to sealed files, stripped when opening them
    pub extension: String,
    /// Replace existing output files instead of refusing
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("~/.config/kinseal/key"),
            env_var: "KINSEAL_KEY".into(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "sealed".into(),
            overwrite: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}
