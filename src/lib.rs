//! khaudum-site: content-managed website for the Khaudum conservancies
//!
//! Public pages are rendered from a single JSON content document which the
//! admin console edits in place. Uploaded images and documents are served
//! from the public directory.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod news;
pub mod server;
pub mod templates;
pub mod upload;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the configuration file inside a site directory
pub const CONFIG_FILE: &str = "site.yml";

/// A site directory and its configuration
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
}

impl Site {
    /// Open a site directory; a missing `site.yml` means default settings
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self { config, base_dir })
    }

    /// Location of the content document
    pub fn content_path(&self) -> PathBuf {
        self.base_dir.join(&self.config.content_file)
    }

    /// Initialize the site directory
    pub fn init(&self) -> Result<()> {
        commands::init::init_site(&self.base_dir)
    }

    /// Start the HTTP server
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        server::start(self, ip, port).await
    }
}
