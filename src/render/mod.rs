pub mod cards;
pub mod rfp;
pub mod tenders;
pub mod text;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub use text::{escape_attr, escape_html, format_resume_text, highlight_keyword};

/// Parses the date shapes the backend emits: ISO-8601 with or without offset,
/// Flask's RFC 2822 (`Sat, 01 Mar 2025 00:00:00 GMT`) and bare `YYYY-MM-DD`.
/// Naive values are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `M/D/YYYY`, or the raw value when it is not a recognizable date.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn is_overdue(raw: Option<&str>, now: DateTime<Utc>) -> bool {
    raw.and_then(parse_date).map(|due| due < now).unwrap_or(false)
}
