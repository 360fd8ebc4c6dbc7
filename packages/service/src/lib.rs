#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation-facing restaurant inspection service.
//!
//! [`HealthInspectionService`] wraps the jurisdiction registry, the fetch
//! client, and a [`ResultCache`]. Multi-jurisdiction requests run one
//! jurisdiction after another and tolerate individual failures.

pub mod cache;

use std::sync::Arc;

use restaurant_health_models::{GradeDescriptor, Restaurant, RestaurantFilters, RiskDescriptor};
use restaurant_health_source::grading::{GradingSystemInfo, grading_system_info};
use restaurant_health_source::{
    FetchClient, JsonClient, Registry, SourceError, available_locations, fetch_restaurants,
};
use serde::Serialize;

pub use cache::ResultCache;

/// Summary of one registered jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionInfo {
    /// Registry code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// State abbreviation.
    pub state: String,
    /// Dataset page, when known.
    pub portal_url: Option<String>,
}

/// A jurisdiction that failed during an aggregated fetch.
#[derive(Debug)]
pub struct JurisdictionFailure {
    /// Registry code.
    pub jurisdiction: String,
    /// What went wrong.
    pub error: SourceError,
}

/// Result of a multi-jurisdiction fetch.
#[derive(Debug, Default)]
pub struct Aggregated {
    /// Restaurants from every jurisdiction that succeeded, in request order.
    pub restaurants: Vec<Restaurant>,
    /// Jurisdictions that failed.
    pub failures: Vec<JurisdictionFailure>,
}

/// Cached access to every registered jurisdiction.
pub struct HealthInspectionService {
    registry: Registry,
    client: Box<dyn JsonClient>,
    cache: ResultCache,
}

impl HealthInspectionService {
    /// Builds the service with the embedded registry, the HTTP client, and
    /// a cache configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SourceError> {
        let cache = ResultCache::from_env();
        log::debug!("Result cache TTL: {}s", cache.ttl().as_secs());
        Ok(Self::with_parts(
            Registry::new(),
            Box::new(FetchClient::new()?),
            cache,
        ))
    }

    /// Builds the service from explicit parts.
    #[must_use]
    pub fn with_parts(registry: Registry, client: Box<dyn JsonClient>, cache: ResultCache) -> Self {
        Self {
            registry,
            client,
            cache,
        }
    }

    /// The result cache.
    #[must_use]
    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Lists every registered jurisdiction in display order.
    #[must_use]
    pub fn get_available_jurisdictions(&self) -> Vec<JurisdictionInfo> {
        self.registry
            .list_jurisdictions()
            .into_iter()
            .filter_map(|code| self.registry.get_config(code).ok())
            .map(|config| JurisdictionInfo {
                code: config.id.clone(),
                name: config.name.clone(),
                state: config.state.clone(),
                portal_url: config.portal_url(),
            })
            .collect()
    }

    /// Lists the locations a jurisdiction can be filtered by.
    ///
    /// When the portal cannot be queried, the configured default locations
    /// are returned and nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownJurisdiction`] for an unregistered code.
    pub async fn get_available_locations(&self, code: &str) -> Result<Arc<[String]>, SourceError> {
        let adapter = self.registry.adapter(code)?;
        if let Some(hit) = self.cache.get_locations(code) {
            log::debug!("{code}: location cache hit");
            return Ok(hit);
        }

        match available_locations(adapter, self.client.as_ref()).await {
            Ok(locations) => Ok(self.cache.put_locations(code, locations)),
            Err(e) => {
                log::warn!("{code}: could not list locations, using defaults: {e}");
                let mut defaults = adapter.config().default_locations.clone();
                defaults.sort();
                Ok(defaults.into())
            }
        }
    }

    /// Describes a jurisdiction's grading vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownJurisdiction`] for an unregistered code.
    pub fn get_grading_system_info(&self, code: &str) -> Result<GradingSystemInfo, SourceError> {
        self.registry.get_config(code).map(grading_system_info)
    }

    /// Fetches restaurants for one jurisdiction, served from the cache when
    /// an identical request is still fresh.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownJurisdiction`] for an unregistered code
    /// and propagates fetch failures. Failures are never cached.
    pub async fn get_restaurants(
        &self,
        code: &str,
        filters: &RestaurantFilters,
    ) -> Result<Arc<[Restaurant]>, SourceError> {
        let adapter = self.registry.adapter(code)?;
        if let Some(hit) = self.cache.get(code, filters) {
            log::debug!("{code}: cache hit ({} restaurants)", hit.len());
            return Ok(hit);
        }
        log::debug!("{code}: cache miss");

        let restaurants = fetch_restaurants(adapter, self.client.as_ref(), filters).await?;
        Ok(self.cache.put(code, filters, restaurants))
    }

    /// Fetches restaurants from several jurisdictions in turn. An empty
    /// `codes` slice means every registered jurisdiction.
    ///
    /// A failing jurisdiction is logged and reported in
    /// [`Aggregated::failures`]; the others still contribute.
    pub async fn get_restaurants_across(
        &self,
        codes: &[String],
        filters: &RestaurantFilters,
    ) -> Aggregated {
        let codes: Vec<String> = if codes.is_empty() {
            self.registry
                .list_jurisdictions()
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            codes.to_vec()
        };

        let mut aggregated = Aggregated::default();
        for code in codes {
            match self.get_restaurants(&code, filters).await {
                Ok(restaurants) => aggregated.restaurants.extend(restaurants.iter().cloned()),
                Err(error) => {
                    log::warn!("Skipping {code}: {error}");
                    aggregated.failures.push(JurisdictionFailure {
                        jurisdiction: code,
                        error,
                    });
                }
            }
        }
        aggregated
    }

    /// Describes a raw grade. Never fails.
    #[must_use]
    pub fn get_grade_info(&self, code: &str, grade: &str) -> GradeDescriptor {
        self.registry.get_grade_info(code, grade)
    }

    /// Describes a raw risk level. Never fails.
    #[must_use]
    pub fn get_risk_info(&self, code: &str, risk: &str) -> RiskDescriptor {
        self.registry.get_risk_info(code, risk)
    }
}
