//! Form-to-model mapper
//!
//! Rebuilds a page's content from an admin submission. Iteration is driven by
//! the existing page: a submission can change values but never introduces new
//! fields. Scalars take an uploaded file (`new_<field>`) over submitted text,
//! and fall back to the previous value when nothing was posted. List sections
//! are transposed from parallel columns into items, with item uploads
//! (`<section>_<field>_<index>`) replacing the posted text at that position.

use std::collections::HashSet;

use super::model::{FieldKind, FieldValue, Item, PageContent};
use super::schema::ARTICLES_FIELD;
use super::submission::{PageSubmission, SectionSubmission};
use crate::upload::UploadMap;

/// Result of mapping a submission onto a page
#[derive(Debug, Clone, PartialEq)]
pub struct MappedPage {
    pub content: PageContent,
    /// Stored uploads that no field picked up
    pub unused_uploads: Vec<String>,
}

/// Upload field name for a scalar field
pub fn scalar_upload_name(field: &str) -> String {
    format!("new_{}", field)
}

/// Upload field name for one field of one list item
pub fn item_upload_name(section: &str, field: &str, index: usize) -> String {
    format!("{}_{}_{}", section, field, index)
}

/// Produce the new content for a page
pub fn map_submission(
    existing: &PageContent,
    submission: &PageSubmission,
    uploads: &UploadMap,
) -> MappedPage {
    let mut used: HashSet<String> = HashSet::new();
    let mut content = existing.clone();

    for (key, value) in content.iter_mut() {
        match value.kind() {
            Some(FieldKind::Scalar) => {
                let upload_name = scalar_upload_name(key);
                if let Some(path) = uploads.get(&upload_name) {
                    used.insert(upload_name);
                    *value = FieldValue::Text(path.clone());
                } else if let Some(text) = submission.scalar(key) {
                    *value = FieldValue::Text(text.to_string());
                }
            }
            Some(FieldKind::ItemList) => match submission.section(key) {
                Some(section) => {
                    *value = FieldValue::Items(build_items(key, section, uploads, &mut used));
                }
                None if key != ARTICLES_FIELD => {
                    *value = FieldValue::Items(Vec::new());
                }
                None => {}
            },
            None => {}
        }
    }

    let unused_uploads = uploads
        .iter()
        .filter(|(name, _)| !used.contains(name.as_str()))
        .map(|(_, path)| path.clone())
        .collect();

    MappedPage {
        content,
        unused_uploads,
    }
}

/// Transpose a section's columns into items
fn build_items(
    section_name: &str,
    section: &SectionSubmission,
    uploads: &UploadMap,
    used: &mut HashSet<String>,
) -> Vec<Item> {
    let count = section.item_count();

    let mismatched = section.mismatched_columns();
    if !mismatched.is_empty() {
        tracing::warn!(
            "Section {} has {} items but columns {:?} differ in length; extra values dropped",
            section_name,
            count,
            mismatched
        );
    }

    (0..count)
        .map(|index| {
            let mut item = Item::new();
            for field in section.columns.keys() {
                let upload_name = item_upload_name(section_name, field, index);
                let value = match uploads.get(&upload_name) {
                    Some(path) => {
                        used.insert(upload_name);
                        Some(path.as_str())
                    }
                    None => section.value(field, index),
                };
                if let Some(value) = value {
                    item.insert(field.clone(), serde_json::Value::String(value.to_string()));
                }
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(json: serde_json::Value) -> PageContent {
        serde_json::from_value(json).unwrap()
    }

    fn uploads(pairs: &[(&str, &str)]) -> UploadMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scalar_takes_submitted_value() {
        let existing = page(json!({"heroImage": "/uploads/old.jpg"}));
        let submission = PageSubmission::from_fields(vec![("heroImage", "v")]);
        let mapped = map_submission(&existing, &submission, &UploadMap::new());
        assert_eq!(mapped.content["heroImage"], FieldValue::Text("v".into()));
    }

    #[test]
    fn test_scalar_upload_wins_over_text() {
        let existing = page(json!({"heroImage": "/uploads/old.jpg"}));
        let submission = PageSubmission::from_fields(vec![("heroImage", "typed")]);
        let files = uploads(&[("new_heroImage", "/uploads/new_heroImage-1-2.jpg")]);
        let mapped = map_submission(&existing, &submission, &files);
        assert_eq!(
            mapped.content["heroImage"],
            FieldValue::Text("/uploads/new_heroImage-1-2.jpg".into())
        );
        assert!(mapped.unused_uploads.is_empty());
    }

    #[test]
    fn test_scalar_without_submission_is_unchanged() {
        let existing = page(json!({"heroImage": "/uploads/old.jpg"}));
        let mapped = map_submission(&existing, &PageSubmission::default(), &UploadMap::new());
        assert_eq!(mapped.content["heroImage"], FieldValue::Text("/uploads/old.jpg".into()));
    }

    #[test]
    fn test_section_columns_become_items() {
        let existing = page(json!({"teamMembers": [{"name": "Old"}]}));
        let submission = PageSubmission::from_fields(vec![
            ("teamMembers[name][]", "Anna"),
            ("teamMembers[role][]", "Chair"),
            ("teamMembers[image][]", "/uploads/anna.jpg"),
            ("teamMembers[name][]", "Ben"),
            ("teamMembers[role][]", "Ranger"),
            ("teamMembers[image][]", "/uploads/ben.jpg"),
        ]);
        let mapped = map_submission(&existing, &submission, &UploadMap::new());
        let items = mapped.content["teamMembers"].as_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], json!("Anna"));
        assert_eq!(items[0]["role"], json!("Chair"));
        assert_eq!(items[1]["name"], json!("Ben"));
        assert_eq!(items[1]["image"], json!("/uploads/ben.jpg"));
    }

    #[test]
    fn test_item_upload_replaces_positional_value() {
        let existing = page(json!({"partners": []}));
        let submission = PageSubmission::from_fields(vec![
            ("partners[name][]", "WWF"),
            ("partners[logo][]", "/uploads/wwf.png"),
            ("partners[name][]", "NNF"),
            ("partners[logo][]", ""),
        ]);
        let files = uploads(&[
            ("partners_logo_1", "/uploads/partners_logo_1-9-9.png"),
            ("partners_logo_5", "/uploads/partners_logo_5-9-9.png"),
        ]);
        let mapped = map_submission(&existing, &submission, &files);
        let items = mapped.content["partners"].as_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["logo"], json!("/uploads/wwf.png"));
        assert_eq!(items[1]["logo"], json!("/uploads/partners_logo_1-9-9.png"));
        // an upload past the last item never creates one
        assert_eq!(mapped.unused_uploads, vec!["/uploads/partners_logo_5-9-9.png".to_string()]);
    }

    #[test]
    fn test_short_column_leaves_field_absent() {
        let existing = page(json!({"products": []}));
        let submission = PageSubmission::from_fields(vec![
            ("products[name][]", "Honey"),
            ("products[name][]", "Thatch"),
            ("products[price][]", "N$50"),
            ("products[price][]", "N$20"),
            ("products[price][]", "N$99"),
            ("products[unit][]", "jar"),
        ]);
        let mapped = map_submission(&existing, &submission, &UploadMap::new());
        let items = mapped.content["products"].as_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["price"], json!("N$20"));
        assert!(!items[1].contains_key("unit"));
    }

    #[test]
    fn test_omitted_section_is_emptied() {
        let existing = page(json!({"images": [{"image": "/uploads/a.jpg"}]}));
        let mapped = map_submission(&existing, &PageSubmission::default(), &UploadMap::new());
        assert_eq!(mapped.content["images"], FieldValue::Items(Vec::new()));
    }

    #[test]
    fn test_omitted_articles_untouched() {
        let existing = page(json!({"articles": [{"id": 1, "title": "Kept"}]}));
        let mapped = map_submission(&existing, &PageSubmission::default(), &UploadMap::new());
        assert_eq!(mapped.content, existing);
    }

    #[test]
    fn test_unknown_fields_are_not_introduced() {
        let existing = page(json!({"heroImage": "", "meta": {"seo": "x"}}));
        let submission = PageSubmission::from_fields(vec![
            ("meta", "flattened"),
            ("intruder", "value"),
            ("extra[name][]", "nope"),
        ]);
        let mapped = map_submission(&existing, &submission, &UploadMap::new());
        assert_eq!(mapped.content.len(), 2);
        assert_eq!(mapped.content["meta"], existing["meta"]);
    }
}
