use std::{env, fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::storage::StorageType;

/// Configuration of the CLI, persisted as TOML.
///
/// Storage location: `$XDG_CONFIG_HOME/gameaid/config.toml`, or
/// `$HOME/.config/gameaid/config.toml` when `XDG_CONFIG_HOME` is unset.
/// Command line flags take precedence over the file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub store_path: Option<PathBuf>,
    pub backend: Option<StorageType>,
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        {
            PathBuf::from(xdg_config_home)
        } else if let Some(home) = home::home_dir() {
            home.join(".config")
        } else {
            return Err(anyhow!(
                "Unable to determine config directory (missing XDG_CONFIG_HOME/HOME)"
            ));
        };
        Ok(config_dir.join("gameaid"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads the configuration from disk, or the defaults if there is no
    /// config file.
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;
        if !config_file.exists() {
            return Ok(Self::default());
        }
        Self::parse(&fs::read_to_string(&config_file).with_context(|| {
            format!("Failed to read config file: {}", config_file.display())
        })?)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config file")
    }

    pub fn with_overrides(
        mut self,
        store_path: Option<PathBuf>,
        backend: Option<StorageType>,
    ) -> Self {
        if store_path.is_some() {
            self.store_path = store_path;
        }
        if backend.is_some() {
            self.backend = backend;
        }
        self
    }

    pub fn backend(&self) -> StorageType {
        self.backend.unwrap_or_default()
    }

    /// The configured store path, or the backend's default below
    /// `~/.gameaid`.
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        let home = home::home_dir()
            .ok_or_else(|| anyhow!("Couldn't retrieve home directory!"))?;
        Ok(self
            .backend()
            .default_path(&home.join(fs_storage::GAMEAID_FOLDER)))
    }
}
