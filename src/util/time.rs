//! Time and date parsing utilities.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Date layouts accepted for row date fields, tried in order.
///
/// Day-first is preferred over month-first for slashed dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d-%b-%Y", "%d %b %Y", "%Y/%m/%d"];

/// Parse a row-supplied date.
///
/// Supports:
/// - ISO: `2025-01-15`
/// - Day-first: `15/01/2025`, `15-01-2025`
/// - Month names: `15-Jan-2025`, `15 Jan 2025`
/// - RFC3339 timestamps, keeping only the date part
///
/// Returns `None` when no layout matches.
#[must_use]
pub fn parse_row_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Parse a stored timestamp (RFC3339, or SQLite's `%Y-%m-%d %H:%M:%S`).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
