//! Configuration management for takeoff
//!
//! Config stored at: ~/.config/takeoff/config.toml

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session file used when neither `--session` nor the config names one
pub const FALLBACK_SESSION: &str = "takeoff.ashproj.json";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default session file
    #[serde(default)]
    pub session_path: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Block catalog override (TOML with `[[block]]` tables)
    #[serde(default)]
    pub block_catalog: Option<PathBuf>,

    /// Currency symbol for summary tables
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_path: None,
            output_format: default_output_format(),
            block_catalog: None,
            currency_symbol: default_currency(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine the user config directory")?
            .join("takeoff");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the user config file, or defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the user config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Session file to use, given an optional command-line override
    pub fn resolve_session(&self, cli_session: Option<&Path>) -> PathBuf {
        cli_session
            .map(Path::to_path_buf)
            .or_else(|| self.session_path.clone())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_SESSION))
    }
}
