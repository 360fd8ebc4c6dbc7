#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized restaurant inspection model shared by every jurisdiction.
//!
//! Each jurisdiction adapter maps its raw rows onto [`Restaurant`] and
//! [`Inspection`] values, and each raw grade value onto a
//! [`GradeDescriptor`], so callers never see a source-specific schema.

pub mod filters;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use filters::{ALL, DEFAULT_LIMIT, DateRange, RestaurantFilters, SearchTerm};

/// Canonical single-element violation list for a clean inspection.
pub const NO_VIOLATIONS: &str = "No violations recorded";

/// Sentinel stored in `inspection_date` when the source date is missing or
/// unparseable.
pub const DATE_NOT_AVAILABLE: &str = "N/A";

/// Display priority of a grade or risk value. Ordered from least to most
/// severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    /// Good standing.
    Low,
    /// Needs attention, or unknown.
    Medium,
    /// Serious problems found.
    High,
}

/// Severity-coded display color.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SeverityColor {
    /// Passing / excellent.
    Green,
    /// Passing with minor issues.
    Yellow,
    /// Conditional or borderline.
    Orange,
    /// Failing or closed.
    Red,
    /// Informational (pending, filed, not applicable).
    Blue,
    /// Unknown or unmapped value.
    Gray,
}

/// Presentation metadata for one raw grade (or risk) value within a
/// jurisdiction's grading system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDescriptor {
    /// Short display form (e.g. `"A"`, `"Pass"`).
    pub label: String,
    /// Prose explanation of what the value means.
    pub description: String,
    /// Severity color.
    pub color: SeverityColor,
    /// Priority, monotonic with risk.
    pub priority: Priority,
}

/// Risk levels share the grade descriptor shape and fallback policy.
pub type RiskDescriptor = GradeDescriptor;

impl GradeDescriptor {
    /// Neutral descriptor returned for a grade value missing from the
    /// jurisdiction's table.
    #[must_use]
    pub fn unknown_grade(raw: &str) -> Self {
        Self {
            label: raw.to_string(),
            description: "Grade information not available".to_string(),
            color: SeverityColor::Gray,
            priority: Priority::Medium,
        }
    }

    /// Neutral descriptor returned for a risk value missing from the
    /// jurisdiction's table.
    #[must_use]
    pub fn unknown_risk(raw: &str) -> Self {
        Self {
            label: raw.to_string(),
            description: "Risk information not available".to_string(),
            color: SeverityColor::Gray,
            priority: Priority::Medium,
        }
    }
}

/// One inspection event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    /// Jurisdiction-native grade value, or a score bucket label for numeric
    /// systems.
    pub grade: String,
    /// Score or points. Direction depends on the jurisdiction; `None` for
    /// pass/fail systems.
    pub score: Option<i64>,
    /// `YYYY-MM-DD`, or [`DATE_NOT_AVAILABLE`].
    pub inspection_date: String,
    /// Violation texts. Never empty: a clean inspection carries
    /// `[NO_VIOLATIONS]`.
    pub violations: Vec<String>,
    /// Inspection type as reported by the source (e.g. `"Canvass"`).
    pub inspection_type: String,
    /// Critical violation marker, when the source provides one.
    pub critical_flag: Option<String>,
    /// Risk category, when the source provides one.
    pub risk_level: Option<String>,
}

impl Inspection {
    /// Returns `true` when the inspection recorded no violations.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.iter().all(|v| v == NO_VIOLATIONS)
    }

    /// Folds the violations of another row describing the same inspection
    /// event into this one.
    ///
    /// The clean sentinel is dropped as soon as a real violation is known,
    /// and duplicate texts are not repeated.
    pub fn absorb(&mut self, other: Self) {
        if other.is_clean() {
            return;
        }
        if self.is_clean() {
            self.violations.clear();
        }
        for violation in other.violations {
            if !self.violations.contains(&violation) {
                self.violations.push(violation);
            }
        }
        if self.critical_flag.is_none() {
            self.critical_flag = other.critical_flag;
        }
        if self.score.is_none() {
            self.score = other.score;
        }
        if self.risk_level.is_none() {
            self.risk_level = other.risk_level;
        }
    }
}

/// Static establishment fields taken from the first raw row seen for a
/// restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantProfile {
    /// Stable identifier (see [`Restaurant::id`]).
    pub id: String,
    /// Registry code of the jurisdiction.
    pub jurisdiction: String,
    /// Establishment name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Cuisine or facility type.
    pub cuisine_type: String,
    /// Borough / area / zip label used for location filtering.
    pub boro: String,
    /// Phone number, empty when unknown.
    pub phone: String,
    /// License or permit number, when the source provides one.
    pub license: Option<String>,
}

/// A deduplicated establishment with its inspection history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    /// Jurisdiction prefix + license number + normalized name.
    pub id: String,
    /// Registry code of the jurisdiction the restaurant was fetched from.
    pub jurisdiction: String,
    /// Establishment name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Cuisine or facility type.
    pub cuisine_type: String,
    /// Borough / area label.
    pub boro: String,
    /// Phone number.
    pub phone: String,
    /// License or permit number.
    pub license: Option<String>,
    /// Mirrors `inspections[0].grade`.
    pub grade: String,
    /// Mirrors `inspections[0].score`.
    pub score: Option<i64>,
    /// Mirrors `inspections[0].inspection_date`.
    pub inspection_date: String,
    /// Mirrors `inspections[0].violations`.
    pub violations: Vec<String>,
    /// Mirrors `inspections[0].inspection_type`.
    pub inspection_type: String,
    /// Inspection history, most recent first. Never empty.
    pub inspections: Vec<Inspection>,
}

impl Restaurant {
    /// Builds a restaurant from its static fields and inspection history.
    ///
    /// Sorts the history most-recent-first (stable, so equal dates keep
    /// their arrival order) and mirrors the latest inspection into the
    /// compatibility fields. Returns `None` when `inspections` is empty.
    #[must_use]
    pub fn from_inspections(
        profile: RestaurantProfile,
        mut inspections: Vec<Inspection>,
    ) -> Option<Self> {
        // Undated inspections go last so a dated one is mirrored.
        inspections.sort_by(|a, b| {
            let a_missing = a.inspection_date == DATE_NOT_AVAILABLE;
            let b_missing = b.inspection_date == DATE_NOT_AVAILABLE;
            a_missing
                .cmp(&b_missing)
                .then_with(|| b.inspection_date.cmp(&a.inspection_date))
        });
        let latest = inspections.first()?.clone();

        Some(Self {
            id: profile.id,
            jurisdiction: profile.jurisdiction,
            name: profile.name,
            address: profile.address,
            cuisine_type: profile.cuisine_type,
            boro: profile.boro,
            phone: profile.phone,
            license: profile.license,
            grade: latest.grade,
            score: latest.score,
            inspection_date: latest.inspection_date,
            violations: latest.violations,
            inspection_type: latest.inspection_type,
            inspections,
        })
    }

    /// Splits the restaurant into the flat record handed to the
    /// persistence layer and its separate violations list.
    #[must_use]
    pub fn into_record(self) -> (RestaurantRecord, Vec<String>) {
        let record = RestaurantRecord {
            id: self.id,
            name: self.name,
            address: self.address,
            cuisine_type: self.cuisine_type,
            grade: self.grade,
            score: self.score,
            inspection_date: self.inspection_date,
            boro: self.boro,
            phone: self.phone,
            inspection_type: self.inspection_type,
        };
        (record, self.violations)
    }
}

/// Flat restaurant row upserted by id in the persistence cache table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    /// Primary key.
    pub id: String,
    /// Establishment name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Cuisine or facility type.
    pub cuisine_type: String,
    /// Latest grade.
    pub grade: String,
    /// Latest score.
    pub score: Option<i64>,
    /// Latest inspection date.
    pub inspection_date: String,
    /// Area label.
    pub boro: String,
    /// Phone number.
    pub phone: String,
    /// Latest inspection type.
    pub inspection_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspection(date: &str, grade: &str) -> Inspection {
        Inspection {
            grade: grade.to_string(),
            score: Some(10),
            inspection_date: date.to_string(),
            violations: vec![NO_VIOLATIONS.to_string()],
            inspection_type: "Cycle Inspection".to_string(),
            critical_flag: None,
            risk_level: None,
        }
    }

    fn profile() -> RestaurantProfile {
        RestaurantProfile {
            id: "nyc_1_joespizza".to_string(),
            jurisdiction: "nyc".to_string(),
            name: "Joe's Pizza".to_string(),
            address: "1 Main St".to_string(),
            cuisine_type: "Pizza".to_string(),
            boro: "Manhattan".to_string(),
            phone: String::new(),
            license: Some("1".to_string()),
        }
    }

    #[test]
    fn sorts_history_and_mirrors_latest() {
        let restaurant = Restaurant::from_inspections(
            profile(),
            vec![
                inspection("2023-06-01", "C"),
                inspection("2024-03-15", "A"),
                inspection("2024-01-10", "B"),
            ],
        )
        .unwrap();

        let dates: Vec<&str> = restaurant
            .inspections
            .iter()
            .map(|i| i.inspection_date.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-03-15", "2024-01-10", "2023-06-01"]);
        assert_eq!(restaurant.grade, "A");
        assert_eq!(restaurant.inspection_date, "2024-03-15");
        assert_eq!(restaurant.score, restaurant.inspections[0].score);
    }

    #[test]
    fn undated_inspections_sort_last() {
        let restaurant = Restaurant::from_inspections(
            profile(),
            vec![
                inspection(DATE_NOT_AVAILABLE, "Z"),
                inspection("2024-01-10", "B"),
            ],
        )
        .unwrap();
        assert_eq!(restaurant.inspection_date, "2024-01-10");
        assert_eq!(restaurant.inspections[1].inspection_date, DATE_NOT_AVAILABLE);
    }

    #[test]
    fn refuses_empty_history() {
        assert!(Restaurant::from_inspections(profile(), Vec::new()).is_none());
    }

    #[test]
    fn absorb_replaces_clean_sentinel() {
        let mut first = inspection("2024-01-10", "A");
        let mut second = inspection("2024-01-10", "A");
        second.violations = vec!["Mice present".to_string()];
        second.critical_flag = Some("Critical".to_string());

        first.absorb(second.clone());
        first.absorb(second);

        assert_eq!(first.violations, vec!["Mice present".to_string()]);
        assert_eq!(first.critical_flag.as_deref(), Some("Critical"));
        assert!(!first.is_clean());
    }

    #[test]
    fn absorb_ignores_clean_rows() {
        let mut first = inspection("2024-01-10", "A");
        first.violations = vec!["Dirty floors".to_string()];
        first.absorb(inspection("2024-01-10", "A"));
        assert_eq!(first.violations, vec!["Dirty floors".to_string()]);
    }

    #[test]
    fn into_record_splits_violations() {
        let mut latest = inspection("2024-03-15", "A");
        latest.violations = vec!["Mice present".to_string()];
        let restaurant = Restaurant::from_inspections(profile(), vec![latest]).unwrap();

        let (record, violations) = restaurant.into_record();
        assert_eq!(record.id, "nyc_1_joespizza");
        assert_eq!(record.grade, "A");
        assert_eq!(violations, vec!["Mice present".to_string()]);
    }

    #[test]
    fn unknown_grade_is_neutral() {
        let descriptor = GradeDescriptor::unknown_grade("totally-unknown-value");
        assert_eq!(descriptor.label, "totally-unknown-value");
        assert_eq!(descriptor.priority, Priority::Medium);
        assert_eq!(descriptor.color, SeverityColor::Gray);
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(Priority::High.to_string(), "high");
        assert_eq!(
            serde_json::to_string(&Priority::Medium).unwrap(),
            "\"medium\""
        );
        assert!(Priority::Low < Priority::Medium && Priority::Medium < Priority::High);
    }
}
