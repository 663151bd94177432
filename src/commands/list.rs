//! List site content

use anyhow::Result;
use std::sync::Arc;

use crate::content::{ContentStore, FieldValue, PageSchema, SiteContent};
use crate::helpers::format_date;
use crate::news::{Article, ArticleRepository};
use crate::Site;

/// List site content by type
pub async fn run(site: &Site, content_type: &str) -> Result<()> {
    let lines = match content_type {
        "page" | "pages" => {
            let store = ContentStore::open_read_only(site.content_path()).await;
            let content = store.snapshot().await;
            println!("Pages ({}):", content.len());
            page_lines(&content)
        }
        "article" | "articles" | "news" => {
            let store = Arc::new(ContentStore::open_read_only(site.content_path()).await);
            let articles = ArticleRepository::new(store, &site.config.article_placeholder)
                .list()
                .await;
            println!("Articles ({}):", articles.len());
            article_lines(&articles)
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: pages, articles",
                content_type
            );
        }
    };

    for line in lines {
        println!("  {}", line);
    }
    Ok(())
}

fn page_lines(content: &SiteContent) -> Vec<String> {
    content
        .iter()
        .map(|(key, page)| {
            let fields: Vec<String> = page
                .iter()
                .map(|(name, value)| match value {
                    FieldValue::Items(items) => format!("{}: {}", name, items.len()),
                    FieldValue::Text(text) if text.is_empty() => format!("{}: -", name),
                    FieldValue::Text(text) => format!("{}: {}", name, text),
                    FieldValue::Other(_) => format!("{}: ?", name),
                })
                .collect();
            let known = if PageSchema::find(key).is_some() { "" } else { " (unknown)" };
            format!("{}{} [{}]", key, known, fields.join(", "))
        })
        .collect()
}

fn article_lines(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|article| {
            format!(
                "{} - {} [{}] #{}",
                format_date(&article.date, "YYYY-MM-DD"),
                article.title,
                article.tag,
                article.id
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::default_site_content;

    #[test]
    fn test_page_lines() {
        let mut content = default_site_content();
        content["home"].insert(
            "heroImage".to_string(),
            FieldValue::Text("/uploads/hero.jpg".to_string()),
        );
        let lines = page_lines(&content);
        assert_eq!(lines.len(), content.len());
        assert!(lines[0].starts_with("home [heroImage: /uploads/hero.jpg, initiatives: 0"));
        assert!(lines.iter().any(|l| l == "hunting []"));
    }

    #[tokio::test]
    async fn test_listing_leaves_directory_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        run(&site, "pages").await.unwrap();
        run(&site, "articles").await.unwrap();
        assert!(!site.content_path().exists());
        assert!(run(&site, "tags").await.is_err());
    }

    #[test]
    fn test_article_lines() {
        let article = Article {
            id: 7,
            title: "Rhino count".to_string(),
            date: "2024-03-01".to_string(),
            tag: "Wildlife".to_string(),
            content: String::new(),
            image: String::new(),
        };
        assert_eq!(
            article_lines(&[article]),
            vec!["2024-03-01 - Rhino count [Wildlife] #7"]
        );
    }
}
