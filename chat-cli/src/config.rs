//! Configuration management for hmchat.
//!
//! Two files live in the data directory:
//! - `config.toml`: optional polling and HTTP settings (`[client]`, `[http]`)
//! - `session.json`: the chat token saved by `hmchat login`

use anyhow::{Context, Result};
use chat_client::{ChatToken, ClientConfig, HttpTransportConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

/// Settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Polling loop settings.
    pub client: ClientConfig,
    /// HTTP transport settings.
    pub http: HttpTransportConfig,
}

impl CliConfig {
    /// Default config path inside a data directory.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Load configuration from a file that must exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// A saved login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Token used for every chat API call.
    pub chat_token: ChatToken,
    /// When the session was saved (seconds since epoch).
    pub created_at: i64,
}

impl Session {
    /// Create a session for a token.
    pub fn new(chat_token: ChatToken) -> Self {
        Self {
            chat_token,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Load the session from a data directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SESSION_FILE);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not logged in. Run 'hmchat login' first.")?;
        serde_json::from_str(&contents).context("Invalid session file")
    }

    /// Save the session to a data directory (owner read/write only).
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(SESSION_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        write_private(&path, contents.as_bytes())
            .await
            .context("Failed to save session")?;
        // open() keeps the mode of a file that already exists
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Delete the saved session. Returns false if there was none.
    pub async fn remove(data_dir: &Path) -> Result<bool> {
        let path = data_dir.join(SESSION_FILE);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path)
            .await
            .context("Failed to remove session")?;
        Ok(true)
    }

    /// Check if a session is saved.
    pub fn exists(data_dir: &Path) -> bool {
        data_dir.join(SESSION_FILE).exists()
    }
}

/// Write a file that is created owner read/write only on Unix.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.flush().await
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
