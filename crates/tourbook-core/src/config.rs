//! Application configuration management.
//!
//! Holds the backend URL, which token storage backend to use and the
//! expiry sweep interval. Stored at `~/.config/tourbook/config.json`;
//! `TOURBOOK_*` environment variables override the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{
    FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, SessionStore, SystemClock,
    TokenStorage, DEFAULT_SWEEP_INTERVAL,
};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tourbook";

const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

const ENV_API_URL: &str = "TOURBOOK_API_URL";
const ENV_TOKEN_BACKEND: &str = "TOURBOOK_TOKEN_BACKEND";
const ENV_SWEEP_SECS: &str = "TOURBOOK_SWEEP_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// `<cache_dir>/tourbook/token`
    #[default]
    File,
    Keyring,
    /// Nothing persisted; every start is logged out.
    Memory,
}

impl FromStr for TokenBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" => Ok(TokenBackend::Keyring),
            "memory" => Ok(TokenBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown token backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token_backend: TokenBackend,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_backend: TokenBackend::default(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent) and apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay values from the environment. Bad values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(backend) = var(ENV_TOKEN_BACKEND) {
            match backend.parse() {
                Ok(backend) => self.token_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_BACKEND),
            }
        }
        if let Some(secs) = var(ENV_SWEEP_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.sweep_interval_secs = secs,
                _ => warn!(value = %secs, "Ignoring {}", ENV_SWEEP_SECS),
            }
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn token_storage(&self) -> Result<Box<dyn TokenStorage>> {
        Ok(match self.token_backend {
            TokenBackend::File => Box::new(FileTokenStorage::new(self.cache_dir()?)),
            TokenBackend::Keyring => Box::new(KeyringTokenStorage::new()?),
            TokenBackend::Memory => Box::new(MemoryTokenStorage::new()),
        })
    }

    /// Build the session store for this configuration. The store still
    /// needs `initialize()`.
    pub fn session_store(&self) -> Result<SessionStore> {
        Ok(SessionStore::from_parts(self.token_storage()?, Arc::new(SystemClock)))
    }
}
