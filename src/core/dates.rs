use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{AppError, Result};

/// Parses a caller-supplied due date.
///
/// Accepts a plain calendar date (`2025-04-30`) or an RFC 3339 timestamp
/// (`2025-04-30T00:00:00+05:30`), in which case the date is taken in UTC.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("due_date is required"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| AppError::validation(format!("Unparsable due_date: '{}'", trimmed)))
}

/// Format timestamp as ISO 8601 UTC for documents and API responses
pub fn format_iso8601_utc(utc_time: DateTime<Utc>) -> String {
    utc_time.to_rfc3339()
}
