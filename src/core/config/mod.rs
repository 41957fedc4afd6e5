//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The controller itself only ever sees a [`NavigationConfig`] value, built in
//! code or loaded here. Loading from disk is used by the `softnav` binary.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (`--config`)
//! 2. `$SOFTNAV_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/softnav/config.toml`
//! 4. `~/.softnav/config.toml`
//!
//! Missing files are not an error (defaults are used). A file that exists but
//! cannot be read or parsed is.
//!
//! # Example
//!
//! ```no_run
//! use softnav::core::config::Config;
//!
//! let loaded = Config::load(None).unwrap();
//! println!("cache capacity: {}", loaded.config.max_pages);
//! ```

pub mod schema;

pub use schema::{Filters, NavigationConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SOFTNAV_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: NavigationConfig,
    /// The file it came from, if any.
    pub path: Option<PathBuf>,
}

/// Configuration loader.
pub struct Config;

impl Config {
    /// Load configuration, searching the standard locations when `explicit`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, or if a discovered
    /// file cannot be parsed or fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::read(path)?;
            return Ok(ConfigLoadResult {
                config,
                path: Some(path.to_path_buf()),
            });
        }

        for path in Self::candidates() {
            if path.exists() {
                let config = Self::read(&path)?;
                return Ok(ConfigLoadResult {
                    config,
                    path: Some(path),
                });
            }
        }

        Ok(ConfigLoadResult {
            config: NavigationConfig::default(),
            path: None,
        })
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<NavigationConfig, ConfigError> {
        let config: NavigationConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    fn read(path: &Path) -> Result<NavigationConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: NavigationConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Discovery order for implicit loading.
    fn candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("softnav/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".softnav/config.toml"));
        }
        paths
    }
}
