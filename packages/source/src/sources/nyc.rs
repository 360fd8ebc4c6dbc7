//! New York City DOHMH restaurant inspection results.
//!
//! Dataset: <https://data.cityofnewyork.us/d/43nn-pn8j>
//!
//! One row per violation per inspection, keyed by CAMIS. Restaurants that
//! have not been inspected yet carry the placeholder date `1900-01-01`.
//! Identity is (name, address, CAMIS).

use restaurant_health_models::DATE_NOT_AVAILABLE;
use restaurant_health_source_models::JurisdictionConfig;

use crate::JurisdictionAdapter;
use crate::parsing::{get_str, normalize_date};

/// Placeholder inspection date for establishments not yet inspected.
const UNINSPECTED_DATE: &str = "1900-01-01";

/// NYC adapter.
pub struct NycAdapter {
    config: JurisdictionConfig,
}

impl NycAdapter {
    /// Creates the adapter over the NYC config.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

impl JurisdictionAdapter for NycAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    fn inspection_date(&self, row: &serde_json::Value) -> String {
        let date = normalize_date(get_str(row, &self.config.fields.inspection_date));
        if date == UNINSPECTED_DATE {
            DATE_NOT_AVAILABLE.to_string()
        } else {
            date
        }
    }
}
