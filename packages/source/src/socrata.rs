//! Socrata SODA dialect.
//!
//! Builds SoQL `$where` / `$order` / `$limit` / `$offset` parameters from
//! [`RestaurantFilters`]. Every user-supplied value goes through
//! [`quote_literal`] or [`like_literal`]; parameters are handed to the
//! client as query pairs and URL-encoded there.

use restaurant_health_models::{DateRange, RestaurantFilters, SearchTerm};
use restaurant_health_source_models::JurisdictionConfig;

use crate::grading::GradeSelection;
use crate::{FetchFailure, SourceError};

/// Row cap used when listing distinct locations.
pub const DISTINCT_LIMIT: u64 = 1000;

/// Drops control characters from user input.
fn sanitize(value: &str) -> String {
    value.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Renders a SoQL string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", sanitize(value).replace('\'', "''"))
}

/// Renders an upper-cased `LIKE` pattern literal. `%` in the input is
/// removed so users cannot inject wildcards; `prefix` and `suffix` supply
/// the intended ones.
#[must_use]
pub fn like_literal(value: &str, prefix: &str, suffix: &str) -> String {
    let inner = sanitize(value).replace('%', "").to_uppercase();
    format!("'{prefix}{}{suffix}'", inner.replace('\'', "''"))
}

/// Builds the search clause on `upper(<name field>)`.
#[must_use]
pub fn search_clause(name_field: &str, term: &SearchTerm) -> String {
    match term {
        SearchTerm::Substring(v) => format!("upper({name_field}) like {}", like_literal(v, "%", "%")),
        SearchTerm::Exact(v) => format!(
            "upper({name_field}) = {}",
            quote_literal(&v.to_uppercase())
        ),
        SearchTerm::Prefix(v) => format!("upper({name_field}) like {}", like_literal(v, "", "%")),
    }
}

/// Builds the inclusive date-range clause.
#[must_use]
pub fn date_clause(date_column: &str, range: &DateRange) -> String {
    format!(
        "{date_column} >= '{}T00:00:00' AND {date_column} <= '{}T23:59:59'",
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d"),
    )
}

/// Builds the OR-ed grade clause, or `None` when the selection cannot be
/// expressed with the configured fields.
#[must_use]
pub fn grade_clause(
    config: &JurisdictionConfig,
    selection: &GradeSelection,
) -> Option<String> {
    let mut alternatives = Vec::new();

    if let Some(field) = &config.fields.grade {
        alternatives.extend(
            selection
                .values
                .iter()
                .map(|v| format!("{field} = {}", quote_literal(v))),
        );
    }

    if let Some(field) = &config.fields.score {
        for range in &selection.score_ranges {
            let bounds: Vec<String> = [
                range.min.map(|min| format!("{field} >= {min}")),
                range.max.map(|max| format!("{field} <= {max}")),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !bounds.is_empty() {
                alternatives.push(format!("({})", bounds.join(" AND ")));
            }
        }
    }

    match alternatives.len() {
        0 => None,
        1 => alternatives.pop(),
        _ => Some(format!("({})", alternatives.join(" OR "))),
    }
}

/// Builds the full `$where` expression for a fetch.
#[must_use]
pub fn where_clause(
    config: &JurisdictionConfig,
    base_where: Option<&str>,
    filters: &RestaurantFilters,
    selection: Option<&GradeSelection>,
) -> Option<String> {
    let mut clauses: Vec<String> = Vec::new();

    if let Some(base) = base_where.map(str::trim).filter(|b| !b.is_empty()) {
        clauses.push(base.to_string());
    }

    if let (Some(location), Some(field)) = (filters.location_filter(), &config.fields.location) {
        clauses.push(format!("{field} = {}", quote_literal(location)));
    }

    if let Some(clause) = selection.and_then(|s| grade_clause(config, s)) {
        clauses.push(clause);
    }

    if let Some(term) = filters.search() {
        clauses.push(search_clause(&config.fields.name, &term));
    }

    if let Some(range) = &filters.date_range {
        clauses.push(date_clause(config.fetcher.date_column(), range));
    }

    (!clauses.is_empty()).then(|| clauses.join(" AND "))
}

/// Query parameters for one page.
#[must_use]
pub fn page_params(
    date_column: &str,
    where_expr: Option<&str>,
    limit: u64,
    offset: u64,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("$limit".to_string(), limit.to_string()),
        ("$offset".to_string(), offset.to_string()),
        ("$order".to_string(), format!("{date_column} DESC")),
    ];
    if let Some(expr) = where_expr {
        params.push(("$where".to_string(), expr.to_string()));
    }
    params
}

/// Query parameters listing the distinct values of `field`.
#[must_use]
pub fn distinct_params(field: &str) -> Vec<(String, String)> {
    vec![
        ("$select".to_string(), format!("DISTINCT {field}")),
        ("$order".to_string(), field.to_string()),
        ("$limit".to_string(), DISTINCT_LIMIT.to_string()),
    ]
}

/// Extracts the rows from a SODA response, which must be a JSON array.
///
/// # Errors
///
/// Returns [`SourceError::Fetch`] with [`FetchFailure::Shape`] for any other
/// JSON value.
pub fn rows(body: serde_json::Value, url: &str) -> Result<Vec<serde_json::Value>, SourceError> {
    match body {
        serde_json::Value::Array(rows) => Ok(rows),
        other => Err(SourceError::Fetch {
            url: url.to_string(),
            reason: FetchFailure::Shape(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )),
        }),
    }
}

pub(crate) const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
