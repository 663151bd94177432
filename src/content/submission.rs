//! Typed model of an admin page submission
//!
//! The admin edit form posts list sections as parallel columns
//! (`teamMembers[name][]`, `teamMembers[role][]`, ...) and scalars under their
//! plain field name. [`PageSubmission::from_fields`] turns that wire format into
//! a typed value before any mapping happens.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `section[field]`, `section[field][]` or `section[field][3]`
    static ref SECTION_FIELD: Regex = Regex::new(r"^([^\[\]]+)\[([^\[\]]+)\](?:\[(\d*)\])?$")
        .expect("valid section field pattern");
}

/// Explicit `[n]` indexes at or above this are rejected
const MAX_ITEM_INDEX: usize = 1000;

/// One submitted list section: field name -> per-item values, in posting order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionSubmission {
    /// `None` marks an index skipped by an explicitly indexed form field
    pub columns: IndexMap<String, Vec<Option<String>>>,
}

impl SectionSubmission {
    /// Number of items the section describes (length of the first column)
    pub fn item_count(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }

    /// Value of `field` for item `index`, if that column reaches it
    pub fn value(&self, field: &str, index: usize) -> Option<&str> {
        self.columns
            .get(field)
            .and_then(|column| column.get(index))
            .and_then(|value| value.as_deref())
    }

    /// Columns whose length differs from the item count
    pub fn mismatched_columns(&self) -> Vec<(&str, usize)> {
        let count = self.item_count();
        self.columns
            .iter()
            .filter(|(_, column)| column.len() != count)
            .map(|(name, column)| (name.as_str(), column.len()))
            .collect()
    }

    /// Append a value to a column
    pub fn push(&mut self, field: &str, value: impl Into<String>) {
        self.columns
            .entry(field.to_string())
            .or_default()
            .push(Some(value.into()));
    }

    fn set(&mut self, field: &str, index: usize, value: String) {
        let column = self.columns.entry(field.to_string()).or_default();
        if column.len() <= index {
            column.resize(index + 1, None);
        }
        column[index] = Some(value);
    }
}

/// A parsed admin page submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSubmission {
    pub scalars: IndexMap<String, String>,
    pub sections: IndexMap<String, SectionSubmission>,
}

impl PageSubmission {
    /// Parse submitted text fields in posting order
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::default();

        for (name, value) in fields {
            let name = name.as_ref();
            match SECTION_FIELD.captures(name) {
                Some(caps) => {
                    let index = match caps.get(3).map(|m| m.as_str()) {
                        Some(index) if !index.is_empty() => match index.parse::<usize>() {
                            Ok(index) if index < MAX_ITEM_INDEX => Some(index),
                            _ => {
                                tracing::warn!("Ignoring form field with bad index: {}", name);
                                continue;
                            }
                        },
                        _ => None,
                    };
                    let section = submission.sections.entry(caps[1].to_string()).or_default();
                    match index {
                        Some(index) => section.set(&caps[2], index, value.into()),
                        None => section.push(&caps[2], value),
                    }
                }
                None => {
                    // First value wins for repeated scalar names
                    submission
                        .scalars
                        .entry(name.to_string())
                        .or_insert_with(|| value.into());
                }
            }
        }

        submission
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.scalars.get(key).map(String::as_str)
    }

    pub fn section(&self, key: &str) -> Option<&SectionSubmission> {
        self.sections.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars_and_columns() {
        let submission = PageSubmission::from_fields(vec![
            ("heroImage", "/uploads/hero.jpg"),
            ("initiatives[title][]", "Water points"),
            ("initiatives[image][]", "/uploads/a.jpg"),
            ("initiatives[title][]", "Anti-poaching"),
            ("initiatives[image][]", ""),
        ]);

        assert_eq!(submission.scalar("heroImage"), Some("/uploads/hero.jpg"));
        let section = submission.section("initiatives").unwrap();
        assert_eq!(section.item_count(), 2);
        assert_eq!(section.value("title", 1), Some("Anti-poaching"));
        assert_eq!(section.value("image", 1), Some(""));
        let fields: Vec<&str> = section.columns.keys().map(|k| k.as_str()).collect();
        assert_eq!(fields, vec!["title", "image"]);
    }

    #[test]
    fn test_parse_unbracketed_and_indexed_columns() {
        let submission = PageSubmission::from_fields(vec![
            ("partners[name]", "WWF"),
            ("partners[name]", "NNF"),
            ("events[title][1]", "Second"),
            ("events[title][0]", "First"),
            ("events[place][1]", "Mangetti"),
        ]);

        let partners = submission.section("partners").unwrap();
        assert_eq!(partners.item_count(), 2);
        assert_eq!(partners.value("name", 0), Some("WWF"));

        let events = submission.section("events").unwrap();
        assert_eq!(events.item_count(), 2);
        assert_eq!(events.value("title", 0), Some("First"));
        assert_eq!(events.value("place", 0), None);
        assert_eq!(events.value("place", 1), Some("Mangetti"));
    }

    #[test]
    fn test_out_of_range_indexes_are_skipped() {
        let submission = PageSubmission::from_fields(vec![
            ("events[title][18446744073709551615]", "overflow"),
            ("events[title][1000000000000]", "huge"),
            ("events[title][99999999999999999999999]", "unparseable"),
            ("events[title][1000]", "just over"),
            ("gallery[image][2]", "/uploads/g.jpg"),
        ]);

        assert!(submission.section("events").is_none());
        let gallery = submission.section("gallery").unwrap();
        assert_eq!(gallery.item_count(), 3);
        assert_eq!(gallery.value("image", 2), Some("/uploads/g.jpg"));
    }

    #[test]
    fn test_mismatched_columns_reported() {
        let submission = PageSubmission::from_fields(vec![
            ("products[name][]", "Honey"),
            ("products[name][]", "Devil's claw"),
            ("products[price][]", "N$50"),
        ]);
        let products = submission.section("products").unwrap();
        assert_eq!(products.mismatched_columns(), vec![("price", 1)]);
    }

    #[test]
    fn test_repeated_scalar_keeps_first() {
        let submission = PageSubmission::from_fields(vec![("heroImage", "a"), ("heroImage", "b")]);
        assert_eq!(submission.scalar("heroImage"), Some("a"));
    }
}
