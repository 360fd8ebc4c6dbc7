//! Chicago Department of Public Health food inspections.
//!
//! Dataset: <https://data.cityofchicago.org/d/4ijn-s7e5>
//!
//! One row per inspection. All violations of an inspection share a single
//! `violations` blob separated by `|`, each followed by inspector comments.
//! License numbers are reused across ownership changes and are often `0`,
//! so identity is (name, address) only.

use std::sync::LazyLock;

use regex::Regex;
use restaurant_health_models::RestaurantProfile;
use restaurant_health_source_models::{JurisdictionConfig, ViolationExtractor};

use crate::extract::no_violations;
use crate::parsing::get_str;
use crate::{IdentityKey, JurisdictionAdapter};

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*").unwrap_or_else(|_| unreachable!()));

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\s*-\s*Comments:.*$").unwrap_or_else(|_| unreachable!()));

/// Chicago adapter.
pub struct ChicagoAdapter {
    config: JurisdictionConfig,
}

impl ChicagoAdapter {
    /// Creates the adapter over the Chicago config.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

/// Splits a violation blob and drops the inspector comments.
fn split_violations(blob: &str) -> Vec<String> {
    SEPARATOR
        .split(blob)
        .map(|v| COMMENTS.replace(v, "").trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl JurisdictionAdapter for ChicagoAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    fn violations(&self, row: &serde_json::Value) -> Vec<String> {
        let ViolationExtractor::Delimited { field, .. } = &self.config.fields.violations else {
            return crate::extract::violations(row, &self.config.fields.violations);
        };
        let found = get_str(row, field).map(split_violations).unwrap_or_default();
        if found.is_empty() { no_violations() } else { found }
    }

    fn identity(&self, profile: &RestaurantProfile) -> IdentityKey {
        IdentityKey::new(&profile.name, &profile.address, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch_restaurants;
    use crate::grading::GradeSelection;
    use crate::registry::jurisdiction;
    use crate::testing::FakeClient;
    use restaurant_health_models::RestaurantFilters;

    fn adapter() -> ChicagoAdapter {
        ChicagoAdapter::new(jurisdiction("chicago").unwrap())
    }

    fn row(license: &str, date: &str, results: &str) -> serde_json::Value {
        serde_json::json!({
            "inspection_id": "2590001",
            "dba_name": "HAROLD'S CHICKEN",
            "license_": license,
            "facility_type": "Restaurant",
            "risk": "Risk 1 (High)",
            "address": "100 W MADISON ST ",
            "city": "CHICAGO",
            "state": "IL",
            "zip": "60602",
            "inspection_date": date,
            "inspection_type": "Canvass",
            "results": results,
            "violations": "3. MANAGEMENT, FOOD EMPLOYEE AND CONDITIONAL EMPLOYEE; KNOWLEDGE - Comments: NO EMPLOYEE HEALTH POLICY | 55. PHYSICAL FACILITIES INSTALLED - Comments: REPAIR CEILING"
        })
    }

    #[test]
    fn conditional_pass_matches_common_b() {
        let config = jurisdiction("chicago").unwrap();
        let selection = GradeSelection::from_requested(&config.grading, &["B".to_string()]).unwrap();
        let inspection = adapter().inspection(&row("1", "2024-02-01T00:00:00.000", "Pass w/ Conditions"));
        assert!(selection.accepts(&inspection.grade, inspection.score));
    }

    #[tokio::test]
    async fn common_b_queries_native_value() {
        let client = FakeClient::new(vec![]);
        let filters = RestaurantFilters {
            grades: vec!["B".to_string()],
            ..RestaurantFilters::default()
        };
        fetch_restaurants(&adapter(), &client, &filters).await.unwrap();
        assert_eq!(
            client.param(0, "$where").as_deref(),
            Some("results IS NOT NULL AND results = 'Pass w/ Conditions'")
        );
    }

    #[test]
    fn splits_violations_without_comments() {
        let inspection = adapter().inspection(&row("1", "2024-02-01T00:00:00.000", "Fail"));
        assert_eq!(
            inspection.violations,
            vec![
                "3. MANAGEMENT, FOOD EMPLOYEE AND CONDITIONAL EMPLOYEE; KNOWLEDGE",
                "55. PHYSICAL FACILITIES INSTALLED",
            ]
        );
        assert_eq!(inspection.risk_level.as_deref(), Some("Risk 1 (High)"));
    }

    #[test]
    fn comment_marker_is_case_insensitive_and_spans_lines() {
        assert_eq!(
            split_violations("38. INSECTS - comments: MICE\nDROPPINGS FOUND | 47. UTENSILS"),
            vec!["38. INSECTS", "47. UTENSILS"]
        );
        assert!(split_violations("").is_empty());
    }

    #[tokio::test]
    async fn license_changes_do_not_split_restaurants() {
        let client = FakeClient::new(vec![serde_json::json!([
            row("2345", "2024-02-01T00:00:00.000", "Pass"),
            row("0", "2023-06-01T00:00:00.000", "Fail"),
        ])]);
        let restaurants = fetch_restaurants(&adapter(), &client, &RestaurantFilters::default())
            .await
            .unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].inspections.len(), 2);
        assert_eq!(restaurants[0].grade, "Pass");
        assert_eq!(restaurants[0].address, "100 W MADISON ST, CHICAGO IL, 60602");
    }
}
