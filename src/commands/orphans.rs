//! Report stored uploads that no content refers to
//!
//! Uploads are written before the content document is saved, so a failed
//! save or a replaced image leaves files behind. This lists them; deleting
//! is left to the operator.

use anyhow::Result;
use std::collections::HashSet;
use walkdir::WalkDir;

use crate::content::{referenced_paths, ContentStore, SiteContent};
use crate::upload::UploadStore;
use crate::Site;

pub async fn run(site: &Site) -> Result<()> {
    let store = ContentStore::open_read_only(site.content_path()).await;
    let uploads = UploadStore::from_config(&site.base_dir, &site.config);

    let orphans = orphaned_files(&uploads, &store.snapshot().await);
    println!("Orphaned uploads ({}):", orphans.len());
    for path in orphans {
        println!("  {}", path);
    }
    Ok(())
}

/// Public paths of stored files missing from `content`, sorted
pub fn orphaned_files(uploads: &UploadStore, content: &SiteContent) -> Vec<String> {
    let referenced: HashSet<String> = referenced_paths(content).into_iter().collect();
    let public_dir = uploads.public_dir();

    let mut orphans: Vec<String> = uploads
        .directories()
        .iter()
        .filter(|dir| dir.exists())
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(public_dir).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(format!("/{}", parts.join("/")))
        })
        .filter(|path| !referenced.contains(path))
        .collect();

    orphans.sort();
    orphans
}
