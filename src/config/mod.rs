//! Configuration and credential storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::{SessionUser, StoredToken, TokenStore};

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_media_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_bucket_name() -> String {
    "travel-notes".to_string()
}

/// Application configuration and persisted session
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Backend API base URL (overridable via TRAVELNOTES_SERVER)
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Object storage base URL used when joining media paths directly
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    /// Ask the backend for presigned media URLs instead of joining the base URL
    #[serde(default)]
    pub use_presigned_url: bool,
    /// Bucket name prefixed onto relative media paths
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,
    /// Stored access token
    pub access_token: Option<StoredToken>,
    /// Stored refresh token
    pub refresh_token: Option<String>,
    /// Profile of the signed-in user (from last login)
    pub user: Option<SessionUser>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            media_base_url: default_media_base_url(),
            use_presigned_url: false,
            bucket_name: default_bucket_name(),
            access_token: None,
            refresh_token: None,
            user: None,
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "travelnotes-cli", "travelnotes-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Backend API base URL; TRAVELNOTES_SERVER takes precedence
    pub fn server_url(&self) -> String {
        std::env::var("TRAVELNOTES_SERVER").unwrap_or_else(|_| self.server_url.clone())
    }

    /// Object storage base URL; TRAVELNOTES_MEDIA_URL takes precedence
    pub fn media_base_url(&self) -> String {
        std::env::var("TRAVELNOTES_MEDIA_URL").unwrap_or_else(|_| self.media_base_url.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.access_token.is_some()
    }
}

impl TokenStore for Config {
    fn get_access_token(&self) -> Option<StoredToken> {
        self.access_token.clone()
    }

    fn set_access_token(&mut self, token: String, expires_in: Option<u64>) {
        self.access_token = Some(StoredToken::new(token, expires_in));
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = Some(token);
    }

    fn get_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }

    fn set_user(&mut self, user: SessionUser) {
        self.user = Some(user);
    }

    fn clear_session(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user = None;
    }

    fn persist(&self) -> Result<()> {
        self.save()
    }
}
