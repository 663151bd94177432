//! News article repository
//!
//! Articles live in the `news.articles` list of the site document. Storage
//! order is insertion order (newest insert first); display order is always
//! recomputed from the article dates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::schema::{ARTICLES_FIELD, NEWS_PAGE};
use crate::content::{ContentStore, FieldValue, Item, PageContent, StoreError};
use crate::helpers::compare_dates_desc;
use crate::upload::Submission;

/// A news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: String,
}

impl Article {
    fn from_item(item: &Item) -> Option<Self> {
        let object: serde_json::Map<String, serde_json::Value> =
            item.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        match serde_json::from_value(serde_json::Value::Object(object)) {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!("Skipping malformed article {:?}: {}", item.get("id"), e);
                None
            }
        }
    }

    fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert("id".into(), self.id.into());
        item.insert("title".into(), self.title.clone().into());
        item.insert("date".into(), self.date.clone().into());
        item.insert("tag".into(), self.tag.clone().into());
        item.insert("content".into(), self.content.clone().into());
        item.insert("image".into(), self.image.clone().into());
        item
    }
}

/// Article fields as posted by the admin form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleForm {
    pub title: String,
    pub date: String,
    pub tag: String,
    pub content: String,
    /// Image the edit form was showing, passed back when no new file is attached
    pub current_image: Option<String>,
}

impl ArticleForm {
    pub fn from_submission(submission: &Submission) -> Self {
        let text = |name: &str| submission.field(name).unwrap_or_default().to_string();
        Self {
            title: text("title"),
            date: text("date"),
            tag: text("tag"),
            content: text("content"),
            current_image: submission
                .field("currentImage")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// CRUD over the stored articles
#[derive(Clone)]
pub struct ArticleRepository {
    store: Arc<ContentStore>,
    placeholder: String,
}

impl ArticleRepository {
    pub fn new(store: Arc<ContentStore>, placeholder: impl Into<String>) -> Self {
        Self {
            store,
            placeholder: placeholder.into(),
        }
    }

    /// Articles newest first; equal dates keep their stored order
    pub async fn list(&self) -> Vec<Article> {
        let mut articles = self.stored().await;
        articles.sort_by(|a, b| compare_dates_desc(&a.date, &b.date));
        articles
    }

    pub async fn get(&self, id: i64) -> Option<Article> {
        self.stored().await.into_iter().find(|a| a.id == id)
    }

    /// Create an article and put it at the front of the stored list
    pub async fn add(
        &self,
        form: ArticleForm,
        image: Option<String>,
    ) -> Result<Article, StoreError> {
        let placeholder = self.placeholder.clone();
        let now = chrono::Utc::now().timestamp_millis();

        let article = self
            .store
            .update_page(NEWS_PAGE, move |page| {
                with_articles(page, |items| {
                    let article = Article {
                        id: next_id(items, now),
                        title: form.title,
                        date: form.date,
                        tag: form.tag,
                        content: form.content,
                        image: image.unwrap_or(placeholder),
                    };
                    items.insert(0, article.to_item());
                    article
                })
            })
            .await?;

        tracing::info!("Added article {} ({})", article.id, article.title);
        Ok(article)
    }

    /// Replace every field but the id; `Ok(None)` when no article has `id`
    ///
    /// Without a new upload the image is the one the form passed back, or the
    /// stored one when the form sent none.
    pub async fn edit(
        &self,
        id: i64,
        form: ArticleForm,
        image: Option<String>,
    ) -> Result<Option<Article>, StoreError> {
        if self.get(id).await.is_none() {
            tracing::debug!("Edit of unknown article {}", id);
            return Ok(None);
        }

        let updated = self
            .store
            .update_page(NEWS_PAGE, move |page| {
                with_articles(page, |items| {
                    let index = items.iter().position(|item| item_id(item) == Some(id))?;
                    let stored_image = items[index]
                        .get("image")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let article = Article {
                        id,
                        title: form.title,
                        date: form.date,
                        tag: form.tag,
                        content: form.content,
                        image: image.or(form.current_image).unwrap_or(stored_image),
                    };
                    items[index] = article.to_item();
                    Some(article)
                })
            })
            .await?;

        if let Some(article) = &updated {
            tracing::info!("Updated article {} ({})", article.id, article.title);
        }
        Ok(updated)
    }

    /// Remove an article; removing an unknown id is not an error
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .store
            .update_page(NEWS_PAGE, move |page| {
                with_articles(page, |items| {
                    let before = items.len();
                    items.retain(|item| item_id(item) != Some(id));
                    before != items.len()
                })
            })
            .await?;

        if removed {
            tracing::info!("Deleted article {}", id);
        }
        Ok(removed)
    }

    async fn stored(&self) -> Vec<Article> {
        let page = self.store.page(NEWS_PAGE).await.unwrap_or_default();
        match page.get(ARTICLES_FIELD) {
            Some(FieldValue::Items(items)) => items.iter().filter_map(Article::from_item).collect(),
            _ => Vec::new(),
        }
    }
}

/// Run `f` on the article list of the news page, creating it if the page lacks one
fn with_articles<T>(page: &mut PageContent, f: impl FnOnce(&mut Vec<Item>) -> T) -> T {
    // insert on an existing key keeps its position in the page
    let mut items = match page.insert(ARTICLES_FIELD.to_string(), FieldValue::Items(Vec::new())) {
        Some(FieldValue::Items(items)) => items,
        Some(other) => {
            tracing::warn!("news.articles was not a list ({:?}); resetting it", other);
            Vec::new()
        }
        None => Vec::new(),
    };
    let result = f(&mut items);
    page.insert(ARTICLES_FIELD.to_string(), FieldValue::Items(items));
    result
}

fn item_id(item: &Item) -> Option<i64> {
    item.get("id").and_then(|v| v.as_i64())
}

/// Millisecond timestamp, bumped past the newest existing id
fn next_id(items: &[Item], now_millis: i64) -> i64 {
    let newest = items.iter().filter_map(item_id).max().unwrap_or(i64::MIN);
    now_millis.max(newest.saturating_add(1))
}
