//! Site configuration (site.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,

    // Storage
    pub content_file: String,
    pub public_dir: String,
    pub upload_dir: String,
    pub download_dir: String,

    // News
    pub article_placeholder: String,

    // Admin
    #[serde(default)]
    pub admin: AdminConfig,
    pub session_cookie: String,
    /// Minutes of inactivity before an admin session expires
    pub session_idle_minutes: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Khaudum Conservancies".to_string(),

            content_file: "content.json".to_string(),
            public_dir: "public".to_string(),
            upload_dir: "uploads".to_string(),
            download_dir: "downloads".to_string(),

            article_placeholder: "https://via.placeholder.com/400x200".to_string(),

            admin: AdminConfig::default(),
            session_cookie: "khaudum_session".to_string(),
            session_idle_minutes: 720,
        }
    }
}

impl SiteConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Admin console credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl AdminConfig {
    /// Whether the shipped credential pair is still in use
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
        }
    }
}
