//! Austin Public Health restaurant inspection scores.
//!
//! Dataset: <https://data.austintexas.gov/d/ecmv-9xxi>
//!
//! One row per inspection with a 100-point score (higher is better) and no
//! violation detail. There is no grade column: the grade shown is the
//! score bucket. The address is a Socrata location object whose
//! `human_address` member is itself a JSON-encoded string.

use restaurant_health_source_models::JurisdictionConfig;
use serde::Deserialize;

use crate::JurisdictionAdapter;
use crate::extract::ADDRESS_NOT_AVAILABLE;

/// Field holding the location object.
const ADDRESS_FIELD: &str = "address";

/// Decoded `human_address`.
#[derive(Debug, Default, Deserialize)]
struct HumanAddress {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zip: Option<String>,
}

impl HumanAddress {
    fn format(&self) -> Option<String> {
        let clean = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let city_state: Vec<String> = [clean(&self.city), clean(&self.state)]
            .into_iter()
            .flatten()
            .collect();
        let parts: Vec<String> = [
            clean(&self.address),
            (!city_state.is_empty()).then(|| city_state.join(" ")),
            clean(&self.zip),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Formats the address from a location object, a bare `human_address`
/// string, or a plain street string.
fn format_location(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(object) => match object.get("human_address")? {
            serde_json::Value::String(encoded) => serde_json::from_str::<HumanAddress>(encoded).ok(),
            nested @ serde_json::Value::Object(_) => HumanAddress::deserialize(nested).ok(),
            _ => None,
        }
        .and_then(|h| h.format()),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.starts_with('{') {
                serde_json::from_str::<HumanAddress>(s).ok().and_then(|h| h.format())
            } else {
                (!s.is_empty()).then(|| s.to_string())
            }
        }
        _ => None,
    }
}

/// Austin adapter.
pub struct AustinAdapter {
    config: JurisdictionConfig,
}

impl AustinAdapter {
    /// Creates the adapter over the Austin config.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

impl JurisdictionAdapter for AustinAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    fn address(&self, row: &serde_json::Value) -> String {
        row.get(ADDRESS_FIELD)
            .and_then(format_location)
            .unwrap_or_else(|| ADDRESS_NOT_AVAILABLE.to_string())
    }
}
