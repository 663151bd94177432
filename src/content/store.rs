//! JSON content store
//!
//! Owns the in-memory site document and the single file it is persisted to.
//! Reads share a lock; every mutation goes through one writer lock that is
//! held across modify, write and reload, so concurrent admin submissions
//! cannot lose each other's edits.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::model::{PageContent, SiteContent};
use super::schema::default_site_content;

/// Content store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Page content not found for key: \"{0}\".")]
    UnknownPage(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid content document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared owner of the site document
pub struct ContentStore {
    path: PathBuf,
    content: RwLock<SiteContent>,
    writer: Mutex<()>,
    create_missing: bool,
}

impl ContentStore {
    /// Open the store at `path`, loading (or creating) the document
    pub async fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self::open_with(path.into(), true).await
    }

    /// Open the store for inspection: a missing document is served from the
    /// defaults without being written
    pub async fn open_read_only<P: Into<PathBuf>>(path: P) -> Self {
        Self::open_with(path.into(), false).await
    }

    async fn open_with(path: PathBuf, create_missing: bool) -> Self {
        let store = Self {
            path,
            content: RwLock::new(default_site_content()),
            writer: Mutex::new(()),
            create_missing,
        };
        store.load().await;
        store
    }

    /// Reload the document from disk
    ///
    /// A missing file is created from the defaults. A file that cannot be
    /// parsed is left alone and the defaults are served from memory.
    pub async fn load(&self) {
        let loaded = match read_document(&self.path).await {
            Ok(Some(persisted)) => merge_defaults(persisted),
            Ok(None) if !self.create_missing => default_site_content(),
            Ok(None) => {
                let defaults = default_site_content();
                match write_document(&self.path, &defaults).await {
                    Ok(()) => tracing::info!("Created default content at {:?}", self.path),
                    Err(e) => tracing::error!("Error saving default content: {}", e),
                }
                defaults
            }
            Err(e) => {
                tracing::error!("Error loading content, serving defaults: {}", e);
                default_site_content()
            }
        };

        *self.content.write().await = loaded;
        tracing::debug!("Content loaded from {:?}", self.path);
    }

    /// Persist `content` and reload it
    ///
    /// On a failed write the previous in-memory document is kept.
    pub async fn save(&self, content: &SiteContent) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        self.persist(content).await
    }

    async fn persist(&self, content: &SiteContent) -> Result<(), StoreError> {
        if let Err(e) = write_document(&self.path, content).await {
            tracing::error!("Error saving content: {}", e);
            return Err(e);
        }
        tracing::info!("Content saved to {:?}", self.path);
        self.load().await;
        Ok(())
    }

    /// Copy of the whole document
    pub async fn snapshot(&self) -> SiteContent {
        self.content.read().await.clone()
    }

    /// Copy of one page, if the key exists
    pub async fn page(&self, key: &str) -> Option<PageContent> {
        self.content.read().await.get(key).cloned()
    }

    pub async fn contains_page(&self, key: &str) -> bool {
        self.content.read().await.contains_key(key)
    }

    /// Apply `f` to one page and persist the result
    ///
    /// `f` works on a copy; the in-memory document only changes once the
    /// write has succeeded.
    pub async fn update_page<F, T>(&self, key: &str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PageContent) -> T,
    {
        let _guard = self.writer.lock().await;

        let mut content = self.snapshot().await;
        let page = content
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownPage(key.to_string()))?;
        let result = f(page);

        self.persist(&content).await?;
        Ok(result)
    }
}

/// Shallow merge: persisted pages replace their defaults wholesale
pub fn merge_defaults(persisted: SiteContent) -> SiteContent {
    let mut merged = default_site_content();
    for (key, page) in persisted {
        merged.insert(key, page);
    }
    merged
}

async fn read_document(path: &Path) -> Result<Option<SiteContent>, StoreError> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    // pages are parsed one by one so a single malformed page only loses itself
    let pages: IndexMap<String, serde_json::Value> = serde_json::from_str(&data)?;
    let mut content = SiteContent::new();
    for (key, value) in pages {
        match serde_json::from_value::<PageContent>(value) {
            Ok(page) => {
                content.insert(key, page);
            }
            Err(e) => tracing::warn!(
                "Page {} in {:?} is malformed, using its defaults: {}",
                key,
                path,
                e
            ),
        }
    }
    Ok(Some(content))
}

async fn write_document(path: &Path, content: &SiteContent) -> Result<(), StoreError> {
    let data = serde_json::to_string_pretty(content)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::FieldValue;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        let store = ContentStore::open(&path).await;

        assert!(path.exists());
        assert_eq!(store.snapshot().await, default_site_content());
        let on_disk: SiteContent =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, default_site_content());
    }

    #[tokio::test]
    async fn test_missing_pages_are_backfilled_shallowly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            json!({
                "home": {"heroImage": "/uploads/h.jpg"},
                "legacy": {"note": "kept"}
            })
            .to_string(),
        )
        .unwrap();

        let store = ContentStore::open(&path).await;
        let content = store.snapshot().await;

        for key in default_site_content().keys() {
            assert!(content.contains_key(key), "missing {}", key);
        }
        // present page is taken verbatim, its missing sections are not backfilled
        assert_eq!(content["home"].len(), 1);
        assert_eq!(content["home"]["heroImage"], FieldValue::Text("/uploads/h.jpg".into()));
        assert_eq!(content["about"], default_site_content()["about"]);
        assert!(content.contains_key("legacy"));
    }

    #[tokio::test]
    async fn test_malformed_page_only_resets_that_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            json!({
                "home": {"heroImage": "/uploads/h.jpg"},
                "contact": null,
                "legacy": 5
            })
            .to_string(),
        )
        .unwrap();

        let store = ContentStore::open(&path).await;
        let content = store.snapshot().await;

        assert_eq!(content["home"]["heroImage"], FieldValue::Text("/uploads/h.jpg".into()));
        assert_eq!(content["contact"], default_site_content()["contact"]);
        assert!(!content.contains_key("legacy"));
    }

    #[tokio::test]
    async fn test_read_only_store_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        let store = ContentStore::open_read_only(&path).await;

        assert!(!path.exists());
        assert_eq!(store.snapshot().await, default_site_content());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ContentStore::open(&path).await;

        assert_eq!(store.snapshot().await, default_site_content());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_save_then_load_is_identity() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(dir.path().join("content.json")).await;

        let mut content = default_site_content();
        content["home"].insert("heroImage".into(), FieldValue::Text("/uploads/x.jpg".into()));
        content["gallery"].insert(
            "images".into(),
            serde_json::from_value(json!([{"image": "/uploads/1.jpg", "caption": "Elephants"}]))
                .unwrap(),
        );

        store.save(&content).await.unwrap();
        assert_eq!(store.snapshot().await, content);

        store.load().await;
        assert_eq!(store.snapshot().await, content);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(dir.path().join("content.json")).await;
        let before = store.snapshot().await;

        // a directory squatting on the temp file name makes the write fail
        std::fs::create_dir(dir.path().join("content.json.tmp")).unwrap();

        let result = store
            .update_page("home", |page| {
                page.insert("heroImage".into(), FieldValue::Text("/uploads/lost.jpg".into()));
            })
            .await;

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_update_unknown_page() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(dir.path().join("content.json")).await;
        let result = store.update_page("nowhere", |_| ()).await;
        assert!(matches!(result, Err(StoreError::UnknownPage(key)) if key == "nowhere"));
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ContentStore::open(dir.path().join("content.json")).await);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let key = if i % 2 == 0 { "gallery" } else { "about" };
            let field = if i % 2 == 0 { "images" } else { "teamMembers" };
            handles.push(tokio::spawn(async move {
                store
                    .update_page(key, |page| {
                        if let Some(FieldValue::Items(items)) = page.get_mut(field) {
                            let item = serde_json::from_value(json!({"n": i.to_string()})).unwrap();
                            items.push(item);
                        }
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        store.load().await;
        let content = store.snapshot().await;
        assert_eq!(content["gallery"]["images"].as_items().unwrap().len(), 8);
        assert_eq!(content["about"]["teamMembers"].as_items().unwrap().len(), 8);
    }
}
