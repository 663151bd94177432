//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Date-time layouts accepted from the article form and older content files
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];

/// Parse a date string as entered in the admin console
///
/// # Examples
/// ```ignore
/// parse_date("2024-06-01") // -> Some(2024-06-01T00:00:00)
/// ```
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Newest first; strings that are not dates sort after every real date
pub fn compare_dates_desc(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Format a date string using a Moment.js-style format (`LL`, `YYYY-MM-DD`, ...)
///
/// Strings that do not parse are returned unchanged.
pub fn format_date(s: &str, format: &str) -> String {
    match parse_date(s) {
        Some(dt) if format == "LL" => dt.format("%B %-d, %Y").to_string(),
        Some(dt) => dt.format(&moment_to_chrono_format(format)).to_string(),
        None => s.to_string(),
    }
}

/// Convert Moment.js format tokens to chrono ones
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first so `MMMM` is not eaten by `MM`
    let replacements = [
        ("YYYY", "%Y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_date("2024-06-01").unwrap().date(), expected);
        assert_eq!(parse_date("2024-06-01T09:30").unwrap().date(), expected);
        assert_eq!(parse_date("2024-06-01T09:30:00Z").unwrap().date(), expected);
        assert_eq!(parse_date("June 1, 2024").unwrap().date(), expected);
        assert!(parse_date("soon").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_compare_dates_desc() {
        let mut dates = vec!["2024-01-01", "not a date", "2024-06-01", "2023-12-31"];
        dates.sort_by(|a, b| compare_dates_desc(a, b));
        assert_eq!(dates, vec!["2024-06-01", "2024-01-01", "2023-12-31", "not a date"]);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-15", "LL"), "January 15, 2024");
        assert_eq!(format_date("2024-01-15", "YYYY/MM/DD"), "2024/01/15");
        assert_eq!(format_date("someday", "LL"), "someday");
    }
}
