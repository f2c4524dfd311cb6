use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::RegionCode;

/// Parses a timestamp string into UTC
/// Supports various formats: RFC 3339, ISO 8601 without offset, SQL datetime, date only
pub fn parse_timestamp(timestamp_str: &str) -> Option<DateTime<Utc>> {
    let timestamp_str = timestamp_str.trim();
    if timestamp_str.is_empty() {
        return None;
    }

    // What the API sends (e.g., "2025-12-16T10:30:00Z" or "2025-12-16T10:30:00+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // ISO 8601 without timezone, assume UTC
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive_dt.and_utc());
    }

    // e.g. "2025-12-16 10:30:00"
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S") {
        return Some(naive_dt.and_utc());
    }

    // Date only, midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(timestamp_str, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive_dt| naive_dt.and_utc());
    }

    None
}

/// Collapses runs of whitespace (including newlines) into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// File name every file writer uses for a region, e.g. `trending_US.csv`
pub fn output_file_name(region: &RegionCode, extension: &str) -> String {
    format!("trending_{}.{}", region, extension)
}
