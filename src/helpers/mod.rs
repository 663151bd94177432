//! Helper functions shared by the news listing and templates

mod date;

pub use date::*;
