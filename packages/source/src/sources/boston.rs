//! Boston Inspectional Services food establishment inspections.
//!
//! Dataset: <https://data.boston.gov/dataset?res_id=4582bec6-2b4f-4f9e-bc55-cbaa73117f4c>
//!
//! Served from the CKAN datastore, one row per violation per inspection.
//! Rows are sorted by result date but a license's full history would need
//! far more rows than a page budget allows, so only the latest inspection
//! per license is kept. Violation severity is given as `*`, `**`, or `***`.

use restaurant_health_source_models::JurisdictionConfig;

use crate::JurisdictionAdapter;
use crate::parsing::get_str;

/// Label used for the highest violation severity.
const CRITICAL: &str = "Critical";

/// Boston adapter.
pub struct BostonAdapter {
    config: JurisdictionConfig,
}

impl BostonAdapter {
    /// Creates the adapter over the Boston config.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

impl JurisdictionAdapter for BostonAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    /// Maps `***` to `"Critical"`; lesser severities are not critical.
    fn critical_flag(&self, row: &serde_json::Value) -> Option<String> {
        let level = self
            .config
            .fields
            .risk
            .as_deref()
            .and_then(|f| get_str(row, f))?;
        (level.chars().filter(|c| *c == '*').count() >= 3).then(|| CRITICAL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch_restaurants;
    use crate::registry::jurisdiction;
    use crate::testing::FakeClient;
    use chrono::NaiveDate;
    use restaurant_health_models::{DateRange, RestaurantFilters};

    fn adapter() -> BostonAdapter {
        BostonAdapter::new(jurisdiction("boston").unwrap())
    }

    fn row(name: &str, license: &str, date: &str, level: &str, desc: &str) -> serde_json::Value {
        serde_json::json!({
            "businessname": name,
            "licenseno": license,
            "descript": "Eating & Drinking",
            "result": "HE_Fail",
            "resultdttm": date,
            "violation": "08-3-302.11",
            "viol_level": level,
            "violdesc": desc,
            "address": "1 Main St",
            "city": "Dorchester",
            "state": "MA",
            "zip": "02125"
        })
    }

    fn page(rows: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({"success": true, "result": {"records": rows}})
    }

    #[tokio::test]
    async fn keeps_latest_inspection_only() {
        let client = FakeClient::new(vec![page(vec![
            row("JOE'S", "123", "2024-03-01 10:00:00", "***", "Cross contamination"),
            row("JOE'S", "123", "2024-03-01 10:00:00", "*", "Floors"),
            row("JOE'S", "123", "2023-01-05 09:00:00", "**", "Walls"),
        ])]);
        let restaurants = fetch_restaurants(&adapter(), &client, &RestaurantFilters::default())
            .await
            .unwrap();

        assert_eq!(restaurants.len(), 1);
        let r = &restaurants[0];
        assert_eq!(r.inspections.len(), 1);
        assert_eq!(r.inspection_date, "2024-03-01");
        assert_eq!(
            r.violations,
            vec!["[08-3-302.11] Cross contamination", "[08-3-302.11] Floors"]
        );
        assert_eq!(r.inspections[0].critical_flag.as_deref(), Some(CRITICAL));
        assert_eq!(r.inspections[0].risk_level.as_deref(), Some("***"));
    }

    #[tokio::test]
    async fn search_and_dates_are_applied_in_memory() {
        let client = FakeClient::new(vec![page(vec![
            row("JOE'S PIZZA", "1", "2024-03-01 10:00:00", "*", "a"),
            row("JOE'S PIZZA EXPRESS", "2", "2024-03-01 10:00:00", "*", "b"),
            row("JOE'S PIZZA", "3", "2022-03-01 10:00:00", "*", "c"),
        ])]);
        let filters = RestaurantFilters {
            search_term: Some("\"joe's pizza\"".to_string()),
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )),
            ..RestaurantFilters::default()
        };
        let restaurants = fetch_restaurants(&adapter(), &client, &filters).await.unwrap();

        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].license.as_deref(), Some("1"));
        assert_eq!(client.param(0, "q").as_deref(), Some("joe's pizza"));
        assert_eq!(
            client.param(0, "sort").as_deref(),
            Some("resultdttm desc")
        );
    }

    #[tokio::test]
    async fn substring_search_matches_inside_words() {
        let client = FakeClient::new(vec![page(vec![
            row("PIZZA HOUSE", "1", "2024-03-01 10:00:00", "*", "a"),
            row("TACO SPOT", "2", "2024-03-01 10:00:00", "*", "b"),
        ])]);
        let filters = RestaurantFilters {
            search_term: Some("izz".to_string()),
            ..RestaurantFilters::default()
        };
        let restaurants = fetch_restaurants(&adapter(), &client, &filters).await.unwrap();

        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "PIZZA HOUSE");
        assert_eq!(client.param(0, "q"), None);
    }

    #[tokio::test]
    async fn location_and_grades_become_filters() {
        let client = FakeClient::new(vec![page(vec![])]);
        let filters = RestaurantFilters {
            location: Some("Dorchester".to_string()),
            grades: vec!["C".to_string()],
            ..RestaurantFilters::default()
        };
        fetch_restaurants(&adapter(), &client, &filters).await.unwrap();
        assert_eq!(
            client.param(0, "filters").as_deref(),
            Some(r#"{"city":"Dorchester","result":["HE_Fail","HE_TSOP","HE_Closure"]}"#)
        );
    }

    #[tokio::test]
    async fn empty_datastore_page_yields_nothing() {
        let client = FakeClient::new(vec![page(vec![])]);
        let restaurants = fetch_restaurants(&adapter(), &client, &RestaurantFilters::default())
            .await
            .unwrap();
        assert!(restaurants.is_empty());
    }
}
