//! Shared parsing utilities for raw jurisdiction rows.
//!
//! Common field access, date, and score parsing used across every adapter.

use chrono::{NaiveDate, NaiveDateTime};
use restaurant_health_models::DATE_NOT_AVAILABLE;

/// Gets a trimmed, non-empty string value from a JSON object by field name.
#[must_use]
pub fn get_str<'a>(row: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    row.get(field)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Gets a field as an owned string, converting numbers (some portals
/// return license numbers as JSON numbers).
#[must_use]
pub fn get_string(row: &serde_json::Value, field: &str) -> Option<String> {
    match row.get(field)? {
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parses a score from a JSON number or numeric string, truncating any
/// fractional part. Returns `None` for missing or non-numeric values.
#[must_use]
pub fn parse_score(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_to_i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i64(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

/// Normalizes a source date/datetime string to `YYYY-MM-DD`.
///
/// Accepts Socrata floating timestamps (`2024-01-15T00:00:00.000`), space
/// separated datetimes (`2024-01-15 11:37:21`), bare ISO dates, and
/// `MM/DD/YYYY`. Anything else (or a missing value) becomes `"N/A"`.
#[must_use]
pub fn normalize_date(raw: Option<&str>) -> String {
    raw.and_then(parse_date)
        .map_or_else(|| DATE_NOT_AVAILABLE.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// Parses any of the supported date formats.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }
    None
}
