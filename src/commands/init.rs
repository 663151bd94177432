//! Initialize a new site directory

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::content::default_site_content;
use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Khaudum site configuration

# Site
title: Khaudum Conservancies

# Storage
content_file: content.json
public_dir: public
upload_dir: uploads
download_dir: downloads

# News
article_placeholder: https://via.placeholder.com/400x200

# Admin
# Change these before exposing the admin console.
admin:
  username: admin
  password: password123
session_cookie: khaudum_session
session_idle_minutes: 720
"#;

/// Initialize a site in the given directory
///
/// Existing `site.yml` and content files are left alone, so running this on a
/// live site only fills in what is missing.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::info!("Keeping existing {:?}", config_path);
    } else {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }
    let config = SiteConfig::load(&config_path)?;

    let public_dir = target_dir.join(&config.public_dir);
    fs::create_dir_all(public_dir.join(&config.upload_dir))?;
    fs::create_dir_all(public_dir.join(&config.download_dir))?;

    let content_path = target_dir.join(&config.content_file);
    if content_path.exists() {
        tracing::info!("Keeping existing {:?}", content_path);
    } else {
        if let Some(parent) = content_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&default_site_content())?;
        fs::write(&content_path, json)?;
    }

    Ok(())
}
