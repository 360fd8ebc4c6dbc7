//! Jurisdiction registry: loads every jurisdiction definition from embedded
//! TOML configs and pairs each with its adapter.
//!
//! Each `.toml` file in `packages/source/jurisdictions/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a jurisdiction means
//! creating a TOML file, adding it to the list below, and (only if the
//! source has quirks) writing an adapter in [`crate::sources`].

use restaurant_health_models::{GradeDescriptor, RiskDescriptor};
use restaurant_health_source_models::JurisdictionConfig;

use crate::sources::{
    austin::AustinAdapter, boston::BostonAdapter, chicago::ChicagoAdapter, nyc::NycAdapter,
    seattle::SeattleAdapter, standard::StandardAdapter,
};
use crate::{JurisdictionAdapter, SourceError, grading};

/// Number of registered jurisdictions. Enforced by a test.
#[cfg(test)]
const EXPECTED_JURISDICTION_COUNT: usize = 5;

/// TOML configs embedded at compile time, in display order.
const JURISDICTION_TOMLS: &[(&str, &str)] = &[
    // ── Socrata ──────────────────────────────────────────────────────
    ("nyc", include_str!("../jurisdictions/nyc.toml")),
    ("chicago", include_str!("../jurisdictions/chicago.toml")),
    ("seattle", include_str!("../jurisdictions/seattle.toml")),
    ("austin", include_str!("../jurisdictions/austin.toml")),
    // ── CKAN ─────────────────────────────────────────────────────────
    ("boston", include_str!("../jurisdictions/boston.toml")),
];

/// Returns all registered jurisdiction configs.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the registry tests.
#[must_use]
pub fn all_jurisdictions() -> Vec<JurisdictionConfig> {
    JURISDICTION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_jurisdiction(name, toml_str).unwrap_or_else(|e| panic!("{e}"))
        })
        .collect()
}

/// Parses one jurisdiction definition registered under `name`.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or its `id`
/// differs from `name`.
pub fn parse_jurisdiction(name: &str, toml_str: &str) -> Result<JurisdictionConfig, SourceError> {
    let config: JurisdictionConfig =
        toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
            message: format!("Failed to parse jurisdiction '{name}': {e}"),
        })?;
    if config.id != name {
        return Err(SourceError::Config {
            message: format!("Jurisdiction '{name}' declares id '{}'", config.id),
        });
    }
    Ok(config)
}

/// Wraps a config in the adapter registered for its id.
#[must_use]
pub fn adapter_for(config: JurisdictionConfig) -> Box<dyn JurisdictionAdapter> {
    match config.id.as_str() {
        "nyc" => Box::new(NycAdapter::new(config)),
        "chicago" => Box::new(ChicagoAdapter::new(config)),
        "seattle" => Box::new(SeattleAdapter::new(config)),
        "austin" => Box::new(AustinAdapter::new(config)),
        "boston" => Box::new(BostonAdapter::new(config)),
        _ => Box::new(StandardAdapter::new(config)),
    }
}

/// Lookup table of jurisdiction adapters, keyed by code.
pub struct Registry {
    adapters: Vec<Box<dyn JurisdictionAdapter>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Builds the registry from the embedded jurisdiction definitions.
    ///
    /// # Panics
    ///
    /// Panics if an embedded definition is malformed (see
    /// [`all_jurisdictions`]).
    #[must_use]
    pub fn new() -> Self {
        Self::from_adapters(all_jurisdictions().into_iter().map(adapter_for).collect())
    }

    /// Builds a registry over explicit adapters.
    #[must_use]
    pub fn from_adapters(adapters: Vec<Box<dyn JurisdictionAdapter>>) -> Self {
        Self { adapters }
    }

    /// Registered codes in display order.
    #[must_use]
    pub fn list_jurisdictions(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.code()).collect()
    }

    /// Returns the adapter for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownJurisdiction`] if `code` is not
    /// registered.
    pub fn adapter(&self, code: &str) -> Result<&dyn JurisdictionAdapter, SourceError> {
        self.adapters
            .iter()
            .find(|a| a.code() == code)
            .map(AsRef::as_ref)
            .ok_or_else(|| SourceError::UnknownJurisdiction {
                code: code.to_string(),
            })
    }

    /// Returns the config for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownJurisdiction`] if `code` is not
    /// registered.
    pub fn get_config(&self, code: &str) -> Result<&JurisdictionConfig, SourceError> {
        self.adapter(code).map(JurisdictionAdapter::config)
    }

    /// Describes a raw grade. Never fails: unknown codes and unknown values
    /// both yield the neutral fallback descriptor.
    #[must_use]
    pub fn get_grade_info(&self, code: &str, raw_grade: &str) -> GradeDescriptor {
        self.get_config(code).map_or_else(
            |_| GradeDescriptor::unknown_grade(raw_grade),
            |c| grading::grade_info(&c.grading, raw_grade),
        )
    }

    /// Describes a raw risk level, with the same fallback policy as
    /// [`Self::get_grade_info`].
    #[must_use]
    pub fn get_risk_info(&self, code: &str, raw_risk: &str) -> RiskDescriptor {
        self.get_config(code).map_or_else(
            |_| GradeDescriptor::unknown_risk(raw_risk),
            |c| grading::risk_info(&c.grading, raw_risk),
        )
    }
}

/// Returns the embedded config for `code`, if registered.
#[must_use]
pub fn jurisdiction(code: &str) -> Option<JurisdictionConfig> {
    all_jurisdictions().into_iter().find(|c| c.id == code)
}
