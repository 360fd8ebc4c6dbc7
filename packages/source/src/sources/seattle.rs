//! Seattle & King County food establishment inspections.
//!
//! Dataset: <https://data.kingcounty.gov/d/f29f-zza5>
//!
//! One row per violation per inspection. Ratings run from `1` (Excellent)
//! to `4` (Needs to Improve); `inspection_score` is violation points, lower
//! is better. RED violations are the critical ones. Some rows leave `name`
//! blank and only carry the permit's `program_identifier`.

use restaurant_health_models::RestaurantProfile;
use restaurant_health_source_models::JurisdictionConfig;

use crate::JurisdictionAdapter;
use crate::extract;
use crate::parsing::get_str;

/// Field used when the establishment name is blank.
const FALLBACK_NAME_FIELD: &str = "program_identifier";

/// Seattle / King County adapter.
pub struct SeattleAdapter {
    config: JurisdictionConfig,
}

impl SeattleAdapter {
    /// Creates the adapter over the King County config.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

impl JurisdictionAdapter for SeattleAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    fn profile(&self, row: &serde_json::Value) -> Option<RestaurantProfile> {
        let address = self.address(row);
        if get_str(row, &self.config.fields.name).is_some() {
            return extract::profile(&self.config, row, address);
        }

        let fallback = get_str(row, FALLBACK_NAME_FIELD)?;
        let mut patched = row.clone();
        patched[self.config.fields.name.as_str()] = serde_json::Value::String(fallback.to_string());
        extract::profile(&self.config, &patched, address)
    }
}
