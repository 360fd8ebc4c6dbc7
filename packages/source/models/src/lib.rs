#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Declarative jurisdiction configuration.
//!
//! A [`JurisdictionConfig`] captures everything unique about one city's
//! open-data portal: which API dialect it speaks, which raw fields hold the
//! restaurant and inspection data, and how its native grading vocabulary
//! maps onto [`GradeDescriptor`]s. Configs are deserialized from TOML once
//! at startup and never mutated afterwards.

use restaurant_health_models::{GradeDescriptor, Priority, SeverityColor};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

// ── Top-level jurisdiction definition ────────────────────────────────────

/// A complete, config-driven jurisdiction definition.
#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionConfig {
    /// Registry code (e.g., `"nyc"`).
    pub id: String,
    /// Human-readable name (e.g., `"New York City"`).
    pub name: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Whether raw rows are one-per-inspection-event, so a full history
    /// can be assembled. When `false` only the first (latest) inspection
    /// seen per restaurant is kept.
    #[serde(default = "default_true")]
    pub history: bool,
    /// Locations offered when the portal cannot be queried for them.
    #[serde(default)]
    pub default_locations: Vec<String>,
    /// Optional URL to the human-readable dataset page.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// How to fetch raw rows.
    pub fetcher: FetcherConfig,
    /// Optional app token configuration.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Raw field names.
    pub fields: FieldMapping,
    /// Native grading vocabulary.
    pub grading: GradingSystem,
}

const fn default_true() -> bool {
    true
}

impl JurisdictionConfig {
    /// Returns the dataset page for this jurisdiction.
    ///
    /// An explicit `portal_url` wins; otherwise one is derived from the
    /// fetcher config when possible.
    #[must_use]
    pub fn portal_url(&self) -> Option<String> {
        if let Some(ref url) = self.portal_url {
            return Some(url.clone());
        }
        self.fetcher.derive_portal_url()
    }
}

// ── Fetcher config ───────────────────────────────────────────────────────

/// Which API dialect a jurisdiction speaks, with its tuning constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// Socrata SODA API (`$limit/$offset/$order/$where/$select`).
    Socrata {
        /// Resource URL (e.g., `".../resource/43nn-pn8j.json"`).
        api_url: String,
        /// Date column used for ordering and date-range filtering.
        date_column: String,
        /// Clause always AND-ed into `$where` (e.g., `"grade IS NOT NULL"`).
        #[serde(default)]
        base_where: Option<String>,
        /// Rows requested per page.
        page_size: u64,
        /// Ceiling on raw rows fetched per call.
        max_records: u64,
        /// Delay between page fetches in milliseconds.
        #[serde(default)]
        delay_ms: Option<u64>,
    },
    /// CKAN `datastore_search` action (`resource_id/limit/offset/q/filters`).
    Ckan {
        /// Action URL (e.g., `".../api/3/action/datastore_search"`).
        api_url: String,
        /// Datastore resource ID.
        resource_id: String,
        /// Date column used for sorting.
        date_column: String,
        /// Rows requested per page.
        page_size: u64,
        /// Ceiling on raw rows fetched per call.
        max_records: u64,
        /// Delay between page fetches in milliseconds.
        #[serde(default)]
        delay_ms: Option<u64>,
    },
}

impl FetcherConfig {
    /// Returns the endpoint URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        match self {
            Self::Socrata { api_url, .. } | Self::Ckan { api_url, .. } => api_url,
        }
    }

    /// Returns the configured page size.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        match self {
            Self::Socrata { page_size, .. } | Self::Ckan { page_size, .. } => *page_size,
        }
    }

    /// Returns the raw-row ceiling per call.
    #[must_use]
    pub const fn max_records(&self) -> u64 {
        match self {
            Self::Socrata { max_records, .. } | Self::Ckan { max_records, .. } => *max_records,
        }
    }

    /// Returns the pause between page fetches.
    #[must_use]
    pub const fn delay_ms(&self) -> Option<u64> {
        match self {
            Self::Socrata { delay_ms, .. } | Self::Ckan { delay_ms, .. } => *delay_ms,
        }
    }

    /// Returns the date column used for ordering.
    #[must_use]
    pub fn date_column(&self) -> &str {
        match self {
            Self::Socrata { date_column, .. } | Self::Ckan { date_column, .. } => date_column,
        }
    }

    /// Attempts to derive a human-readable dataset page URL.
    ///
    /// - **Socrata**: `/resource/{id}.json` -> `/d/{id}`
    /// - **CKAN**: `/api/3/action/...` -> `/dataset` search for the resource
    fn derive_portal_url(&self) -> Option<String> {
        match self {
            Self::Socrata { api_url, .. } => api_url.find("/resource/").map(|idx| {
                let base = &api_url[..idx];
                let rest = &api_url[idx + "/resource/".len()..];
                let dataset_id = rest.strip_suffix(".json").unwrap_or(rest);
                format!("{base}/d/{dataset_id}")
            }),
            Self::Ckan {
                api_url,
                resource_id,
                ..
            } => api_url
                .find("/api/")
                .map(|idx| format!("{}/dataset?res_id={resource_id}", &api_url[..idx])),
        }
    }
}

// ── Auth ─────────────────────────────────────────────────────────────────

/// App-token configuration. The token itself is read from the environment
/// at request time; a missing variable means unauthenticated requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the jurisdiction-specific token.
    pub env_var: String,
    /// Shared environment variable tried when `env_var` is unset.
    #[serde(default)]
    pub fallback_env_var: Option<String>,
    /// Header carrying the token (e.g., `"X-App-Token"`).
    #[serde(default)]
    pub header: Option<String>,
    /// Query parameter carrying the token (e.g., `"$$app_token"`).
    #[serde(default)]
    pub query_param: Option<String>,
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Maps raw row field names onto restaurant and inspection fields.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Establishment name field.
    pub name: String,
    /// License / permit number field.
    #[serde(default)]
    pub license: Option<String>,
    /// Field matched exactly by the location filter.
    #[serde(default)]
    pub location: Option<String>,
    /// Cuisine or facility-type field.
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Phone number field.
    #[serde(default)]
    pub phone: Option<String>,
    /// Native grade field. `None` when the grade is derived (e.g., from a
    /// score bucket).
    #[serde(default)]
    pub grade: Option<String>,
    /// Numeric score field.
    #[serde(default)]
    pub score: Option<String>,
    /// Inspection date field.
    pub inspection_date: String,
    /// Inspection type field.
    #[serde(default)]
    pub inspection_type: Option<String>,
    /// Risk category field.
    #[serde(default)]
    pub risk: Option<String>,
    /// Address parts, joined with `", "`. Fields within a part are joined
    /// with a space.
    ///
    /// In TOML: `address = [["building", "street"], ["boro"], ["zipcode"]]`
    #[serde(default)]
    pub address: Vec<Vec<String>>,
    /// How violation texts are stored.
    #[serde(default)]
    pub violations: ViolationExtractor,
}

/// How violation texts are stored in a raw row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationExtractor {
    /// The source carries no violation detail.
    #[default]
    None,
    /// Discrete description / code / critical-flag fields.
    Discrete {
        /// Violation description field.
        description: String,
        /// Violation code field.
        #[serde(default)]
        code: Option<String>,
        /// Critical marker field.
        #[serde(default)]
        critical_flag: Option<String>,
        /// Values of `critical_flag` that mean "critical" (case-insensitive).
        #[serde(default)]
        critical_values: Vec<String>,
    },
    /// A single free-text blob holding every violation.
    Delimited {
        /// Blob field.
        field: String,
        /// Separator between violations.
        delimiter: String,
    },
}

// ── Grading system ───────────────────────────────────────────────────────

/// Family of native grading vocabularies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GradingKind {
    /// Letter grades (A/B/C).
    LetterGrade,
    /// Pass / fail outcomes.
    PassFail,
    /// Numeric score, shown as buckets.
    NumericScore,
    /// Violation-point totals with a rating.
    ViolationPoints,
}

/// Whether a lower or higher score is better.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreDirection {
    /// Fewer points is better (violation points).
    LowerIsBetter,
    /// More points is better (100-point scale).
    HigherIsBetter,
}

/// A jurisdiction's native grading vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct GradingSystem {
    /// Vocabulary family.
    pub kind: GradingKind,
    /// Prose summary for the presentation layer.
    pub description: String,
    /// Score semantics, when the jurisdiction publishes a score.
    #[serde(default)]
    pub score_direction: Option<ScoreDirection>,
    /// Grade shown when a row has no grade.
    #[serde(default = "default_ungraded")]
    pub ungraded: String,
    /// Descriptor table for raw grade values, in display order.
    #[serde(default)]
    pub grades: Vec<GradeEntry>,
    /// Descriptor table for raw risk values, in display order.
    #[serde(default)]
    pub risks: Vec<GradeEntry>,
    /// Translation from the common A/B/C shorthand to native values.
    #[serde(default)]
    pub common: Vec<CommonGrade>,
    /// Score buckets used to label numeric scores, best first.
    #[serde(default)]
    pub score_buckets: Vec<ScoreBucket>,
}

fn default_ungraded() -> String {
    "Not Yet Graded".to_string()
}

impl GradingSystem {
    /// Looks up the grade table entry for an exact raw value.
    #[must_use]
    pub fn grade_entry(&self, raw: &str) -> Option<&GradeEntry> {
        self.grades.iter().find(|g| g.value == raw)
    }

    /// Looks up the risk table entry for an exact raw value.
    #[must_use]
    pub fn risk_entry(&self, raw: &str) -> Option<&GradeEntry> {
        self.risks.iter().find(|r| r.value == raw)
    }

    /// Looks up the common-grade translation (case-insensitive).
    #[must_use]
    pub fn common_grade(&self, grade: &str) -> Option<&CommonGrade> {
        self.common
            .iter()
            .find(|c| c.grade.eq_ignore_ascii_case(grade.trim()))
    }
}

/// One row of a grade or risk descriptor table.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeEntry {
    /// Raw value as it appears in the source.
    pub value: String,
    /// Short display label.
    pub label: String,
    /// Prose explanation.
    pub description: String,
    /// Severity color.
    pub color: SeverityColor,
    /// Priority.
    pub priority: Priority,
}

impl GradeEntry {
    /// Converts the table entry into a presentation descriptor.
    #[must_use]
    pub fn descriptor(&self) -> GradeDescriptor {
        GradeDescriptor {
            label: self.label.clone(),
            description: self.description.clone(),
            color: self.color,
            priority: self.priority,
        }
    }
}

/// Native meaning of one common letter grade.
///
/// Either a set of native values, a score range, or both.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonGrade {
    /// Common shorthand (`"A"`, `"B"`, `"C"`).
    pub grade: String,
    /// Native grade values it stands for.
    #[serde(default)]
    pub values: Vec<String>,
    /// Inclusive lower score bound.
    #[serde(default)]
    pub min_score: Option<i64>,
    /// Inclusive upper score bound.
    #[serde(default)]
    pub max_score: Option<i64>,
}

impl CommonGrade {
    /// Returns `true` if this grade is expressed as a score range.
    #[must_use]
    pub const fn has_score_range(&self) -> bool {
        self.min_score.is_some() || self.max_score.is_some()
    }
}

/// A labelled score range.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreBucket {
    /// Label used as the inspection's grade (e.g., `"90-100"`).
    pub label: String,
    /// Inclusive lower bound.
    #[serde(default)]
    pub min: Option<i64>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub max: Option<i64>,
}

impl ScoreBucket {
    /// Returns `true` if `score` falls inside the bucket.
    #[must_use]
    pub fn contains(&self, score: i64) -> bool {
        self.min.is_none_or(|min| score >= min) && self.max.is_none_or(|max| score <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        id = "testville"
        name = "Testville"
        state = "TX"

        [fetcher]
        type = "socrata"
        api_url = "https://data.testville.gov/resource/abcd-1234.json"
        date_column = "inspection_date"
        page_size = 100
        max_records = 500

        [fields]
        name = "restaurant_name"
        inspection_date = "inspection_date"
        address = [["street_number", "street_name"], ["zip"]]

        [fields.violations]
        type = "delimited"
        field = "violations"
        delimiter = " | "

        [grading]
        kind = "pass_fail"
        description = "Pass or fail"

        [[grading.grades]]
        value = "Pass"
        label = "Pass"
        description = "Passed"
        color = "green"
        priority = "low"

        [[grading.common]]
        grade = "A"
        values = ["Pass"]
    "#;

    fn minimal() -> JurisdictionConfig {
        toml::de::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = minimal();
        assert!(config.history);
        assert!(config.auth.is_none());
        assert_eq!(config.grading.ungraded, "Not Yet Graded");
        assert_eq!(config.fetcher.page_size(), 100);
        assert_eq!(config.fields.address.len(), 2);
        assert!(matches!(
            config.fields.violations,
            ViolationExtractor::Delimited { .. }
        ));
    }

    #[test]
    fn derives_socrata_portal_url() {
        assert_eq!(
            minimal().portal_url().as_deref(),
            Some("https://data.testville.gov/d/abcd-1234")
        );
    }

    #[test]
    fn derives_ckan_portal_url() {
        let fetcher = FetcherConfig::Ckan {
            api_url: "https://data.example.gov/api/3/action/datastore_search".to_string(),
            resource_id: "r-1".to_string(),
            date_column: "resultdttm".to_string(),
            page_size: 10,
            max_records: 10,
            delay_ms: None,
        };
        assert_eq!(
            fetcher.derive_portal_url().as_deref(),
            Some("https://data.example.gov/dataset?res_id=r-1")
        );
    }

    #[test]
    fn common_grade_lookup_is_case_insensitive() {
        let config = minimal();
        let common = config.grading.common_grade(" a ").unwrap();
        assert_eq!(common.values, vec!["Pass".to_string()]);
        assert!(!common.has_score_range());
    }

    #[test]
    fn score_bucket_bounds_are_inclusive() {
        let bucket = ScoreBucket {
            label: "90-100".to_string(),
            min: Some(90),
            max: Some(100),
        };
        assert!(bucket.contains(90));
        assert!(bucket.contains(100));
        assert!(!bucket.contains(89));

        let open = ScoreBucket {
            label: "Below 70".to_string(),
            min: None,
            max: Some(69),
        };
        assert!(open.contains(-5));
        assert!(!open.contains(70));
    }
}
