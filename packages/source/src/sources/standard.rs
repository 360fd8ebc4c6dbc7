//! Adapter for jurisdictions whose rows need no special handling.

use restaurant_health_source_models::JurisdictionConfig;

use crate::JurisdictionAdapter;

/// Purely config-driven adapter.
pub struct StandardAdapter {
    config: JurisdictionConfig,
}

impl StandardAdapter {
    /// Creates an adapter over `config`.
    #[must_use]
    pub const fn new(config: JurisdictionConfig) -> Self {
        Self { config }
    }
}

impl JurisdictionAdapter for StandardAdapter {
    fn config(&self) -> &JurisdictionConfig {
        &self.config
    }
}
