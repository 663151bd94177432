//! Static page schema
//!
//! Every editable page is described once here: which fields it has, whether
//! each is a scalar or a list of items, and which item fields the admin form
//! offers for new rows. The default site document is derived from this table.

use super::model::{FieldKind, FieldValue, PageContent, SiteContent};

/// List section managed exclusively by the article repository
pub const ARTICLES_FIELD: &str = "articles";

/// Page key holding the news articles
pub const NEWS_PAGE: &str = "news";

/// Description of one page field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Item fields offered for new rows (empty for scalars)
    pub item_fields: &'static [&'static str],
}

/// Description of one editable page
#[derive(Debug, Clone, Copy)]
pub struct PageSchema {
    pub key: &'static str,
    pub fields: &'static [FieldSpec],
}

const fn scalar(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Scalar,
        item_fields: &[],
    }
}

const fn list(name: &'static str, item_fields: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::ItemList,
        item_fields,
    }
}

const PERSON: &[&str] = &["name", "role", "image"];
const CARD: &[&str] = &["title", "description", "image"];
const PICTURE: &[&str] = &["image", "caption"];
const DOCUMENT: &[&str] = &["title", "date", "filePath"];

/// All editable pages, in document order
pub const PAGES: &[PageSchema] = &[
    PageSchema {
        key: "home",
        fields: &[
            scalar("heroImage"),
            list("initiatives", CARD),
            list("partners", &["name", "logo", "url"]),
            list("testimonials", &["quote", "author", "image"]),
            list("aboutImages", PICTURE),
        ],
    },
    PageSchema {
        key: "about",
        fields: &[list("teamMembers", PERSON)],
    },
    PageSchema {
        key: "george_mukoya",
        fields: &[
            list("teamMembers", PERSON),
            list("projects", CARD),
            list("galleryImages", PICTURE),
        ],
    },
    PageSchema {
        key: "muduva_nyangana",
        fields: &[
            list("teamMembers", PERSON),
            list("projects", CARD),
            list("galleryImages", PICTURE),
        ],
    },
    PageSchema {
        key: "gallery",
        fields: &[list("images", PICTURE)],
    },
    PageSchema {
        key: NEWS_PAGE,
        fields: &[list(
            ARTICLES_FIELD,
            &["id", "title", "date", "tag", "content", "image"],
        )],
    },
    PageSchema {
        key: "projects",
        fields: &[list("projectCards", CARD)],
    },
    PageSchema {
        key: "natural_resources",
        fields: &[list("products", &["name", "description", "price", "image"])],
    },
    PageSchema {
        key: "hunting",
        fields: &[],
    },
    PageSchema {
        key: "youth_forum",
        fields: &[
            list("projects", CARD),
            list("opportunities", &["title", "description", "deadline"]),
            list("successStories", &["name", "story", "image"]),
            list("events", &["title", "date", "location"]),
        ],
    },
    PageSchema {
        key: "jobs",
        fields: &[
            list("vacancies", &["title", "location", "deadline", "description"]),
            list("tenders", &["title", "deadline", "filePath"]),
        ],
    },
    PageSchema {
        key: "downloads",
        fields: &[
            list("reports", DOCUMENT),
            list("minutes", DOCUMENT),
            list("documents", DOCUMENT),
        ],
    },
    PageSchema {
        key: "contact",
        fields: &[],
    },
];

impl PageSchema {
    /// Look up a page by key
    pub fn find(key: &str) -> Option<&'static PageSchema> {
        PAGES.iter().find(|page| page.key == key)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Default (empty) content for this page
    pub fn default_content(&self) -> PageContent {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), FieldValue::empty(field.kind)))
            .collect()
    }

    /// Human readable title, e.g. `george_mukoya` -> `George Mukoya`
    pub fn display_name(&self) -> String {
        humanize(self.key)
    }
}

/// Default document for the whole site
pub fn default_site_content() -> SiteContent {
    PAGES
        .iter()
        .map(|page| (page.key.to_string(), page.default_content()))
        .collect()
}

/// Fields holding a document for the download centre
pub fn is_download_field(name: &str) -> bool {
    name.contains("filePath")
}

/// Fields whose value is the public path of a stored file
pub fn is_file_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    is_download_field(name)
        || lower.contains("image")
        || lower.contains("logo")
        || lower.contains("photo")
}

/// Label for a key: `george_mukoya` -> `George Mukoya`, `heroImage` -> `Hero Image`
pub fn humanize(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
