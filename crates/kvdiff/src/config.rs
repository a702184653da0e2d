//! User configuration loaded from `config.toml`

use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Defaults read from the config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: OutputFormat,
    pub pretty: bool,
    pub keys_only: bool,
}

impl Config {
    /// `<config dir>/kvdiff/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kvdiff").join("config.toml"))
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A missing default file yields the defaults; an explicitly given path
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Output settings after command line flags are applied over the config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub format: OutputFormat,
    pub pretty: bool,
    pub keys_only: bool,
}

impl Settings {
    pub fn resolve(args: &Args, config: &Config) -> Self {
        Self {
            format: args.format.unwrap_or(config.format),
            pretty: args.pretty || config.pretty,
            keys_only: args.keys_only || config.keys_only,
        }
    }
}
