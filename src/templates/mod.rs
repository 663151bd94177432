//! Site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary. Pages are rendered from
//! view models built here so templates never have to probe for missing keys.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::mapper::{item_upload_name, scalar_upload_name};
use crate::content::schema::{humanize, is_download_field, is_file_field, ARTICLES_FIELD};
use crate::content::{FieldKind, FieldValue, PageContent, PageSchema};
use crate::helpers::format_date;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all site templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("page.html", include_str!("site/page.html")),
            ("admin/login.html", include_str!("site/admin/login.html")),
            ("admin/dashboard.html", include_str!("site/admin/dashboard.html")),
            ("admin/edit_page.html", include_str!("site/admin/edit_page.html")),
            ("admin/news_list.html", include_str!("site/admin/news_list.html")),
            ("admin/news_edit.html", include_str!("site/admin/news_edit.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template_name, context)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        return Ok(tera::Value::String(s));
    }
    let truncated: String = s.chars().take(length).collect();
    Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
}

/// Tera filter: format an article date, e.g. `date_format(format="LL")`
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "LL".to_string(),
    };
    Ok(tera::Value::String(format_date(&s, &format)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub key: String,
    pub title: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Scalar value (empty for lists)
    pub value: String,
    pub is_file: bool,
    pub upload_name: String,
    /// Edited elsewhere (news articles)
    pub managed: bool,
    pub columns: Vec<ColumnView>,
    pub items: Vec<Vec<CellView>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub name: String,
    pub label: String,
    pub is_file: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    pub field: String,
    pub label: String,
    pub value: String,
    pub is_file: bool,
    pub is_download: bool,
    pub upload_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLink {
    pub key: String,
    pub title: String,
}

/// Build the view of one page's content
///
/// List columns come from the schema first, then any extra keys found in the
/// stored items, so every row posts the same columns in the same order.
pub fn page_view(key: &str, page: &PageContent) -> PageView {
    let schema = PageSchema::find(key);
    let title = schema
        .map(|s| s.display_name())
        .unwrap_or_else(|| humanize(key));

    let fields = page
        .iter()
        .filter_map(|(name, value)| {
            let kind = value.kind()?;
            let mut columns: Vec<String> = schema
                .and_then(|s| s.field(name))
                .map(|f| f.item_fields.iter().map(|c| c.to_string()).collect())
                .unwrap_or_default();

            if let FieldValue::Items(items) = value {
                for item in items {
                    for column in item.keys() {
                        if !columns.contains(column) {
                            columns.push(column.clone());
                        }
                    }
                }
            }

            let items = value
                .as_items()
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    columns
                        .iter()
                        .map(|column| CellView {
                            field: column.clone(),
                            label: humanize(column),
                            value: item.get(column).map(display_value).unwrap_or_default(),
                            is_file: is_file_field(column),
                            is_download: is_download_field(column),
                            upload_name: item_upload_name(name, column, index),
                        })
                        .collect()
                })
                .collect();

            Some(FieldView {
                name: name.clone(),
                label: humanize(name),
                kind,
                value: value.as_text().unwrap_or_default().to_string(),
                is_file: is_file_field(name),
                upload_name: scalar_upload_name(name),
                managed: name == ARTICLES_FIELD,
                columns: columns
                    .iter()
                    .map(|column| ColumnView {
                        name: column.clone(),
                        label: humanize(column),
                        is_file: is_file_field(column),
                    })
                    .collect(),
                items,
            })
        })
        .collect();

    PageView {
        key: key.to_string(),
        title,
        fields,
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
