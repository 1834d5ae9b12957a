//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: which
//! panel to talk to, how long to wait for it, and where the session lives.
//!
//! Configuration is stored at `~/.config/bedrock-panel/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialStore, FileBackend, KeyringBackend, MemoryBackend};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "bedrock-panel";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Panel address used when nothing is configured
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Request timeout in seconds, matching the web console's client.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding `server_url`
pub const SERVER_URL_ENV: &str = "BEDROCK_PANEL_URL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStorage {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub session_storage: SessionStorage,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
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

    /// Panel address, with `BEDROCK_PANEL_URL` taking precedence.
    pub fn server_url(&self) -> String {
        std::env::var(SERVER_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Open the session store this configuration asks for.
    pub fn open_credential_store(&self) -> Result<CredentialStore> {
        let store = match self.session_storage {
            SessionStorage::File => CredentialStore::open(FileBackend::new(self.cache_dir()?)),
            SessionStorage::Keyring => CredentialStore::open(
                KeyringBackend::new().context("Failed to open keychain entries")?,
            ),
            SessionStorage::Memory => CredentialStore::open(MemoryBackend::default()),
        };
        Ok(store)
    }
}
