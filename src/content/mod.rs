//! Content module - site document model, page schema, persistence and form mapping

pub mod mapper;
mod model;
pub mod schema;
mod store;
pub mod submission;

pub use mapper::{map_submission, MappedPage};
pub use model::{referenced_paths, FieldKind, FieldValue, Item, PageContent, SiteContent};
pub use schema::{default_site_content, PageSchema};
pub use store::{merge_defaults, ContentStore, StoreError};
pub use submission::{PageSubmission, SectionSubmission};
