//! Config-driven field extraction.
//!
//! These are the default implementations behind the
//! [`JurisdictionAdapter`] hooks. Adapters with source quirks override the
//! hook and may still call back into these helpers.

use restaurant_health_models::{Inspection, NO_VIOLATIONS, RestaurantProfile};
use restaurant_health_source_models::{JurisdictionConfig, ViolationExtractor};

use crate::JurisdictionAdapter;
use crate::parsing::{get_str, get_string, parse_score};

/// Placeholder address when none of the configured fields are present.
pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

/// Placeholder cuisine when the source has no cuisine field or value.
pub const CUISINE_NOT_SPECIFIED: &str = "Not specified";

/// Joins address parts with `", "`; fields within a part are joined with a
/// space. Empty fields and parts are skipped.
#[must_use]
pub fn format_address(row: &serde_json::Value, parts: &[Vec<String>]) -> String {
    let formatted: Vec<String> = parts
        .iter()
        .filter_map(|fields| {
            let words: Vec<String> = fields.iter().filter_map(|f| get_string(row, f)).collect();
            (!words.is_empty()).then(|| words.join(" "))
        })
        .collect();

    if formatted.is_empty() {
        ADDRESS_NOT_AVAILABLE.to_string()
    } else {
        formatted.join(", ")
    }
}

/// Returns the clean-inspection sentinel list.
#[must_use]
pub fn no_violations() -> Vec<String> {
    vec![NO_VIOLATIONS.to_string()]
}

/// Extracts violation texts, falling back to the clean sentinel.
#[must_use]
pub fn violations(row: &serde_json::Value, extractor: &ViolationExtractor) -> Vec<String> {
    let found = match extractor {
        ViolationExtractor::None => Vec::new(),
        ViolationExtractor::Discrete {
            description, code, ..
        } => {
            let code = code.as_deref().and_then(|c| get_str(row, c));
            match (get_str(row, description), code) {
                (Some(text), Some(code)) => vec![format!("[{code}] {text}")],
                (Some(text), None) => vec![text.to_string()],
                (None, Some(code)) => vec![format!("Violation code: {code}")],
                (None, None) => Vec::new(),
            }
        }
        ViolationExtractor::Delimited { field, delimiter } => get_str(row, field)
            .map(|blob| split_violations(blob, delimiter))
            .unwrap_or_default(),
    };

    if found.is_empty() { no_violations() } else { found }
}

/// Splits a violation blob on `delimiter`, trimming and dropping empties.
///
/// Whitespace around the delimiter is optional, so a trailing `" |"` left
/// by trimming the blob still separates.
#[must_use]
pub fn split_violations(blob: &str, delimiter: &str) -> Vec<String> {
    let separator = match delimiter.trim() {
        "" => delimiter,
        trimmed => trimmed,
    };
    blob.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Returns the raw critical flag when it is one of the configured
/// "critical" values (case-insensitive).
#[must_use]
pub fn critical_flag(row: &serde_json::Value, extractor: &ViolationExtractor) -> Option<String> {
    let ViolationExtractor::Discrete {
        critical_flag: Some(field),
        critical_values,
        ..
    } = extractor
    else {
        return None;
    };

    let value = get_str(row, field)?;
    critical_values
        .iter()
        .any(|c| c.eq_ignore_ascii_case(value))
        .then(|| value.to_string())
}

/// Extracts the native grade. Without a grade field, the score is labelled
/// with the matching score bucket. Falls back to the grading system's
/// "ungraded" label.
#[must_use]
pub fn grade(row: &serde_json::Value, config: &JurisdictionConfig, score: Option<i64>) -> String {
    let grading = &config.grading;
    if let Some(field) = &config.fields.grade {
        return get_str(row, field).map_or_else(|| grading.ungraded.clone(), String::from);
    }
    score
        .and_then(|s| crate::grading::score_bucket(grading, s))
        .map_or_else(|| grading.ungraded.clone(), String::from)
}

/// Builds the static restaurant fields from a row.
#[must_use]
pub fn profile(
    config: &JurisdictionConfig,
    row: &serde_json::Value,
    address: String,
) -> Option<RestaurantProfile> {
    let fields = &config.fields;
    let name = get_str(row, &fields.name)?.to_string();
    let license = fields.license.as_deref().and_then(|f| get_string(row, f));
    let optional = |field: &Option<String>| {
        field
            .as_deref()
            .and_then(|f| get_string(row, f))
            .unwrap_or_default()
    };

    let cuisine_type = fields
        .cuisine
        .as_deref()
        .and_then(|f| get_string(row, f))
        .unwrap_or_else(|| CUISINE_NOT_SPECIFIED.to_string());

    Some(RestaurantProfile {
        id: restaurant_id(&config.id, license.as_deref(), &name, &address),
        jurisdiction: config.id.clone(),
        boro: optional(&fields.location),
        phone: optional(&fields.phone),
        name,
        address,
        cuisine_type,
        license,
    })
}

/// Builds the inspection for one row using the adapter's hooks.
pub fn inspection<A: JurisdictionAdapter + ?Sized>(
    adapter: &A,
    row: &serde_json::Value,
) -> Inspection {
    let fields = &adapter.config().fields;
    let score = fields.score.as_deref().and_then(|f| parse_score(row.get(f)));

    Inspection {
        grade: adapter.grade(row, score),
        score,
        inspection_date: adapter.inspection_date(row),
        violations: adapter.violations(row),
        inspection_type: fields
            .inspection_type
            .as_deref()
            .and_then(|f| get_string(row, f))
            .unwrap_or_default(),
        critical_flag: adapter.critical_flag(row),
        risk_level: fields.risk.as_deref().and_then(|f| get_string(row, f)),
    }
}

/// Builds a stable restaurant id from the jurisdiction prefix, the license
/// number, and the normalized name. Without a license the normalized
/// address stands in for it.
#[must_use]
pub fn restaurant_id(code: &str, license: Option<&str>, name: &str, address: &str) -> String {
    let name = slug(name);
    license.map_or_else(
        || format!("{code}_{}_{name}", slug(address)),
        |license| format!("{code}_{}_{name}", slug(license)),
    )
}

/// Lowercases and keeps only ASCII alphanumerics.
#[must_use]
pub fn slug(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
