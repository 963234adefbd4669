//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data file and locking
    #[serde(default)]
    pub store: StoreConfig,

    /// Default signed-in user
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Leaderboard presentation
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Member invitations
    #[serde(default)]
    pub invite: InviteConfig,
}

/// Data file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON export file holding projects, tasks and comments
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// How long to wait for the data file lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_data_file() -> String {
    "taskboard.json".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Identity used when no flag or environment variable is given
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Show at most this many entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Invitation message sent when a member is added
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteConfig {
    #[serde(default = "default_invite_subject")]
    pub subject: String,

    #[serde(default = "default_invite_body")]
    pub body: String,

    /// Where queued invitations are written: a file path or "-" for stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbox: Option<String>,
}

fn default_invite_subject() -> String {
    "You're invited to TaskBoardPro".to_string()
}

fn default_invite_body() -> String {
    "You've been invited to join a project on TaskBoardPro.\n\nOpen the app to access it!"
        .to_string()
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            subject: default_invite_subject(),
            body: default_invite_body(),
            outbox: None,
        }
    }
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Data file path, resolved against `base` when relative
    pub fn data_path(&self, base: &Path) -> PathBuf {
        let path = PathBuf::from(self.store.data_file.trim());
        if path.is_absolute() {
            path
        } else {
            base.join(path)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.store.data_file.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "store.data_file cannot be empty".to_string(),
            ));
        }
        if self.store.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if let Some(email) = &self.identity.email {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err(Error::InvalidConfig(format!(
                    "identity.email '{email}' is not an email address"
                )));
            }
        }
        if self.leaderboard.limit == Some(0) {
            return Err(Error::InvalidConfig(
                "leaderboard.limit must be > 0".to_string(),
            ));
        }
        if self.invite.subject.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "invite.subject cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
