//! CKAN Datastore dialect.
//!
//! `datastore_search` only supports exact-match `filters` and full-text
//! `q`, so search-mode precision and date ranges are re-applied to each
//! normalized row by [`RowFilter`].

use restaurant_health_models::{DateRange, RestaurantFilters, SearchTerm};
use restaurant_health_source_models::JurisdictionConfig;

use crate::grading::GradeSelection;
use crate::normalize::NormalizedRow;
use crate::socrata::json_kind;
use crate::{FetchFailure, SourceError};

/// Row cap used when listing distinct locations.
pub const DISTINCT_LIMIT: u64 = 1000;

/// Builds the `filters` JSON object: exact location and grade value lists.
#[must_use]
pub fn filters_object(
    config: &JurisdictionConfig,
    filters: &RestaurantFilters,
    selection: Option<&GradeSelection>,
) -> Option<serde_json::Map<String, serde_json::Value>> {
    let mut object = serde_json::Map::new();

    if let (Some(location), Some(field)) = (filters.location_filter(), &config.fields.location) {
        object.insert(field.clone(), serde_json::Value::String(clean(location)));
    }

    if let (Some(selection), Some(field)) = (selection, &config.fields.grade)
        && !selection.values.is_empty()
        && selection.score_ranges.is_empty()
    {
        object.insert(
            field.clone(),
            serde_json::Value::Array(
                selection
                    .values
                    .iter()
                    .map(|v| serde_json::Value::String(v.clone()))
                    .collect(),
            ),
        );
    }

    (!object.is_empty()).then_some(object)
}

fn clean(value: &str) -> String {
    value.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Query parameters for one page.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the filters object cannot be
/// serialized.
pub fn page_params(
    resource_id: &str,
    date_column: &str,
    search: Option<&SearchTerm>,
    filters: Option<&serde_json::Map<String, serde_json::Value>>,
    limit: u64,
    offset: u64,
) -> Result<Vec<(String, String)>, SourceError> {
    let mut params = vec![
        ("resource_id".to_string(), resource_id.to_string()),
        ("limit".to_string(), limit.to_string()),
        ("offset".to_string(), offset.to_string()),
        ("sort".to_string(), format!("{date_column} desc")),
    ];
    // `q` matches whole words, so only an exact name can narrow the page
    // server side. Substring and prefix terms are applied by `RowFilter`.
    if let Some(SearchTerm::Exact(name)) = search {
        params.push(("q".to_string(), clean(name)));
    }
    if let Some(filters) = filters {
        params.push(("filters".to_string(), serde_json::to_string(filters)?));
    }
    Ok(params)
}

/// Query parameters listing the distinct values of `field`.
#[must_use]
pub fn distinct_params(resource_id: &str, field: &str) -> Vec<(String, String)> {
    vec![
        ("resource_id".to_string(), resource_id.to_string()),
        ("fields".to_string(), field.to_string()),
        ("distinct".to_string(), "true".to_string()),
        ("limit".to_string(), DISTINCT_LIMIT.to_string()),
    ]
}

/// Extracts `result.records` from a `datastore_search` response.
///
/// # Errors
///
/// Returns [`SourceError::Fetch`] with [`FetchFailure::Shape`] when the
/// action reports `success: false` or the records array is missing.
pub fn records(body: serde_json::Value, url: &str) -> Result<Vec<serde_json::Value>, SourceError> {
    let shape = |message: String| SourceError::Fetch {
        url: url.to_string(),
        reason: FetchFailure::Shape(message),
    };

    if body.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        let detail = body
            .get("error")
            .map_or_else(|| "no detail".to_string(), ToString::to_string);
        return Err(shape(format!("datastore_search failed: {detail}")));
    }

    match body {
        serde_json::Value::Object(mut root) => match root
            .remove("result")
            .and_then(|mut r| r.get_mut("records").map(serde_json::Value::take))
        {
            Some(serde_json::Value::Array(records)) => Ok(records),
            Some(other) => Err(shape(format!(
                "expected result.records to be an array, got {}",
                json_kind(&other)
            ))),
            None => Err(shape("missing result.records".to_string())),
        },
        other => Err(shape(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Predicates applied in memory to rows from dialects that cannot express
/// them server-side.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    search: Option<SearchTerm>,
    date_range: Option<DateRange>,
    selection: Option<GradeSelection>,
}

impl RowFilter {
    /// Captures the predicates of `filters`.
    #[must_use]
    pub fn new(filters: &RestaurantFilters, selection: Option<GradeSelection>) -> Self {
        Self {
            search: filters.search(),
            date_range: filters.date_range,
            selection,
        }
    }

    /// Returns `true` if the row passes every predicate.
    #[must_use]
    pub fn accepts(&self, row: &NormalizedRow) -> bool {
        self.search
            .as_ref()
            .is_none_or(|term| term.matches(&row.profile.name))
            && self
                .date_range
                .as_ref()
                .is_none_or(|range| range.contains(&row.inspection.inspection_date))
            && self
                .selection
                .as_ref()
                .is_none_or(|s| s.accepts(&row.inspection.grade, row.inspection.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_records() {
        let body = serde_json::json!({
            "success": true,
            "result": {"records": [{"businessname": "A"}, {"businessname": "B"}]}
        });
        assert_eq!(records(body, "u").unwrap().len(), 2);
    }

    #[test]
    fn failed_action_is_shape_error() {
        let body = serde_json::json!({"success": false, "error": {"message": "bad"}});
        assert!(matches!(
            records(body, "u"),
            Err(SourceError::Fetch {
                reason: FetchFailure::Shape(_),
                ..
            })
        ));
    }

    #[test]
    fn missing_records_is_shape_error() {
        let body = serde_json::json!({"success": true, "result": {}});
        assert!(records(body, "u").is_err());
    }

    #[test]
    fn page_params_encode_filters_and_query() {
        let mut filters = serde_json::Map::new();
        filters.insert("city".to_string(), serde_json::json!("Dorchester"));
        let term = SearchTerm::Exact("Joe's Pizza".to_string());
        let params = page_params("r-1", "resultdttm", Some(&term), Some(&filters), 100, 0).unwrap();
        assert!(params.contains(&("q".to_string(), "Joe's Pizza".to_string())));
        assert!(params.contains(&("sort".to_string(), "resultdttm desc".to_string())));
        assert!(params.contains(&(
            "filters".to_string(),
            r#"{"city":"Dorchester"}"#.to_string()
        )));
    }

    #[test]
    fn partial_name_terms_are_not_sent_as_full_text() {
        for term in [
            SearchTerm::Substring("izz".to_string()),
            SearchTerm::Prefix("Jo".to_string()),
        ] {
            let params = page_params("r-1", "resultdttm", Some(&term), None, 100, 0).unwrap();
            assert!(
                params.iter().all(|(k, _)| k != "q"),
                "{term:?} should be filtered in memory"
            );
        }
    }
}
