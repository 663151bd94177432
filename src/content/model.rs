//! Site content document model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whole site document, keyed by page key
pub type SiteContent = IndexMap<String, PageContent>;

/// One page's editable fields
pub type PageContent = IndexMap<String, FieldValue>;

/// One record inside a list-valued field
pub type Item = IndexMap<String, serde_json::Value>;

/// Shape of a page field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A single string, such as an image path
    Scalar,
    /// An ordered list of items
    ItemList,
}

/// Value stored under a page field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Items(Vec<Item>),
    /// Anything else found in the persisted document; carried through untouched
    Other(serde_json::Value),
}

impl FieldValue {
    /// Shape of this value, if it is one the mapper knows how to rebuild
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Text(_) => Some(FieldKind::Scalar),
            FieldValue::Items(_) => Some(FieldKind::ItemList),
            FieldValue::Other(_) => None,
        }
    }

    /// Empty value of the given shape
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => FieldValue::Text(String::new()),
            FieldKind::ItemList => FieldValue::Items(Vec::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[Item]> {
        match self {
            FieldValue::Items(items) => Some(items),
            _ => None,
        }
    }
}

/// Collect every string value in a page that looks like a public file path
pub fn referenced_paths(content: &SiteContent) -> Vec<String> {
    let mut paths = Vec::new();
    for page in content.values() {
        for value in page.values() {
            match value {
                FieldValue::Text(s) if s.starts_with('/') => paths.push(s.clone()),
                FieldValue::Items(items) => {
                    for item in items {
                        for v in item.values() {
                            if let Some(s) = v.as_str().filter(|s| s.starts_with('/')) {
                                paths.push(s.to_string());
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_shapes() {
        let page: PageContent = serde_json::from_str(
            r#"{"heroImage": "/uploads/a.jpg", "partners": [{"name": "WWF"}], "meta": {"x": 1}, "tags": ["a"]}"#,
        )
        .unwrap();
        assert_eq!(page["heroImage"].kind(), Some(FieldKind::Scalar));
        assert_eq!(page["partners"].kind(), Some(FieldKind::ItemList));
        assert_eq!(page["meta"].kind(), None);
        assert_eq!(page["tags"].kind(), None);
    }

    #[test]
    fn test_numeric_item_values_survive() {
        let page: PageContent =
            serde_json::from_str(r#"{"articles": [{"id": 1700000000000, "title": "Hi"}]}"#).unwrap();
        let items = page["articles"].as_items().unwrap();
        assert_eq!(items[0]["id"], serde_json::json!(1700000000000u64));
    }

    #[test]
    fn test_referenced_paths() {
        let content: SiteContent = serde_json::from_str(
            r#"{"home": {"heroImage": "/uploads/h.jpg", "partners": [{"logo": "/uploads/p.png", "name": "x"}]},
                "news": {"articles": [{"image": "https://via.placeholder.com/400x200"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            referenced_paths(&content),
            vec!["/uploads/h.jpg".to_string(), "/uploads/p.png".to_string()]
        );
    }
}
