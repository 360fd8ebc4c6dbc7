#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Restaurant inspection sources and normalization logic.
//!
//! Each jurisdiction implements the [`JurisdictionAdapter`] trait to define
//! how its raw rows map onto the common [`Restaurant`] / [`Inspection`]
//! model. The shared [`fetch`] driver pages through the jurisdiction's API
//! via a [`JsonClient`], folds rows into deduplicated restaurants, and
//! applies the in-memory filters.

pub mod ckan;
pub mod client;
pub mod extract;
pub mod fetch;
pub mod grading;
pub mod normalize;
pub mod parsing;
pub mod registry;
pub mod retry;
pub mod socrata;
pub mod sources;

#[cfg(test)]
mod testing;

use restaurant_health_models::{Inspection, RestaurantProfile};
use restaurant_health_source_models::JurisdictionConfig;
use strum_macros::{AsRefStr, Display};

pub use client::{FetchClient, JsonClient};
pub use fetch::{available_locations, fetch_restaurants};
pub use normalize::{IdentityKey, NormalizedRow};
pub use registry::Registry;
pub use restaurant_health_models::Restaurant;

/// Errors that can occur while fetching or normalizing jurisdiction data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested jurisdiction code is not registered.
    #[error("Unknown jurisdiction: {code}")]
    UnknownJurisdiction {
        /// The code that was requested.
        code: String,
    },

    /// A non-retryable failure: non-2xx status, malformed body, or a
    /// request that could not be sent.
    #[error("Fetch from {url} failed: {reason}")]
    Fetch {
        /// Endpoint that failed.
        url: String,
        /// What went wrong.
        reason: FetchFailure,
    },

    /// A retryable failure that exhausted its retry budget.
    #[error("Fetch from {url} failed after {attempts} attempts ({kind}): {message}")]
    TransientFetch {
        /// Endpoint that failed.
        url: String,
        /// Category of the last failure.
        kind: TransientKind,
        /// Total attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// JSON serialization failed while building a request.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedded configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl SourceError {
    /// Returns `true` for failures that were retried before surfacing.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }
}

/// Reason for a non-retryable fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),
    /// The body was not valid JSON.
    #[error("invalid JSON response: {0}")]
    Parse(String),
    /// The body was JSON but not in the expected shape.
    #[error("unexpected response shape: {0}")]
    Shape(String),
    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),
}

/// Category of a retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TransientKind {
    /// The request or body read timed out.
    Timeout,
    /// The connection could not be established.
    Connection,
    /// The body stream failed mid-read.
    Other,
}

/// Per-jurisdiction normalization hooks.
///
/// Every hook has a default driven by the jurisdiction's
/// [`JurisdictionConfig`]; adapters override only the quirks of their
/// source (address formatting, violation extraction, grade derivation,
/// identity tuple).
pub trait JurisdictionAdapter: Send + Sync {
    /// Returns the static configuration.
    fn config(&self) -> &JurisdictionConfig;

    /// Returns the registry code.
    fn code(&self) -> &str {
        &self.config().id
    }

    /// Formats the address from the raw row.
    fn address(&self, row: &serde_json::Value) -> String {
        extract::format_address(row, &self.config().fields.address)
    }

    /// Extracts the violation texts, never returning an empty list.
    fn violations(&self, row: &serde_json::Value) -> Vec<String> {
        extract::violations(row, &self.config().fields.violations)
    }

    /// Extracts the critical-violation marker.
    fn critical_flag(&self, row: &serde_json::Value) -> Option<String> {
        extract::critical_flag(row, &self.config().fields.violations)
    }

    /// Extracts the native grade (or derives it from `score`).
    fn grade(&self, row: &serde_json::Value, score: Option<i64>) -> String {
        extract::grade(row, self.config(), score)
    }

    /// Extracts the inspection date as `YYYY-MM-DD` or `"N/A"`.
    fn inspection_date(&self, row: &serde_json::Value) -> String {
        parsing::normalize_date(parsing::get_str(
            row,
            &self.config().fields.inspection_date,
        ))
    }

    /// Builds the static restaurant fields, or `None` when the row has no
    /// usable name.
    fn profile(&self, row: &serde_json::Value) -> Option<RestaurantProfile> {
        extract::profile(self.config(), row, self.address(row))
    }

    /// Builds the identity tuple used for deduplication.
    ///
    /// Defaults to (name, address, license) when the jurisdiction has a
    /// license field, otherwise (name, address).
    fn identity(&self, profile: &RestaurantProfile) -> IdentityKey {
        IdentityKey::new(&profile.name, &profile.address, profile.license.as_deref())
    }

    /// Builds the inspection described by one raw row.
    fn inspection(&self, row: &serde_json::Value) -> Inspection {
        extract::inspection(self, row)
    }

    /// Normalizes one raw row. Rows without a name are dropped.
    fn normalize_row(&self, row: &serde_json::Value) -> Option<NormalizedRow> {
        let profile = self.profile(row)?;
        let key = self.identity(&profile);
        let inspection = self.inspection(row);
        Some(NormalizedRow {
            key,
            profile,
            inspection,
        })
    }
}
