//! Grading translator.
//!
//! Pure lookups over a jurisdiction's [`GradingSystem`]: raw grade and risk
//! values become [`GradeDescriptor`]s, common letter grades become native
//! values or score ranges, and numeric scores become bucket labels.

use restaurant_health_models::{ALL, GradeDescriptor, RiskDescriptor};
use restaurant_health_source_models::{
    GradingKind, GradingSystem, JurisdictionConfig, ScoreDirection,
};
use serde::Serialize;

/// Describes a raw grade value. Unknown values get a neutral gray
/// descriptor labelled with the input.
#[must_use]
pub fn grade_info(grading: &GradingSystem, raw: &str) -> GradeDescriptor {
    grading
        .grade_entry(raw)
        .map_or_else(|| GradeDescriptor::unknown_grade(raw), |e| e.descriptor())
}

/// Describes a raw risk value, with the same fallback as [`grade_info`].
#[must_use]
pub fn risk_info(grading: &GradingSystem, raw: &str) -> RiskDescriptor {
    grading
        .risk_entry(raw)
        .map_or_else(|| GradeDescriptor::unknown_risk(raw), |e| e.descriptor())
}

/// Native grade values a common letter grade stands for. Unmapped input is
/// passed through as a native value.
#[must_use]
pub fn native_grade_values(grading: &GradingSystem, common: &str) -> Vec<String> {
    grading.common_grade(common).map_or_else(
        || vec![common.trim().to_string()],
        |c| c.values.clone(),
    )
}

/// Inclusive score range a common letter grade stands for, when the
/// jurisdiction expresses it as one.
#[must_use]
pub fn score_range(grading: &GradingSystem, common: &str) -> Option<ScoreRange> {
    grading
        .common_grade(common)
        .filter(|c| c.has_score_range())
        .map(|c| ScoreRange {
            min: c.min_score,
            max: c.max_score,
        })
}

/// Label of the score bucket containing `score`.
#[must_use]
pub fn score_bucket(grading: &GradingSystem, score: i64) -> Option<&str> {
    grading
        .score_buckets
        .iter()
        .find(|b| b.contains(score))
        .map(|b| b.label.as_str())
}

/// Inclusive score bounds; an open side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRange {
    /// Lower bound.
    pub min: Option<i64>,
    /// Upper bound.
    pub max: Option<i64>,
}

impl ScoreRange {
    /// Returns `true` if `score` lies within the bounds.
    #[must_use]
    pub fn contains(&self, score: i64) -> bool {
        self.min.is_none_or(|min| score >= min) && self.max.is_none_or(|max| score <= max)
    }
}

/// A requested grade filter resolved against one jurisdiction's grading
/// system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeSelection {
    /// Native grade values to accept.
    pub values: Vec<String>,
    /// Score ranges to accept.
    pub score_ranges: Vec<ScoreRange>,
}

impl GradeSelection {
    /// Resolves requested grades.
    ///
    /// Common letter grades map through the jurisdiction's translation
    /// table, score-bucket labels become their ranges, and anything else is
    /// treated as a native value. Returns `None` when nothing is requested
    /// or `"All"` is among the requested grades.
    #[must_use]
    pub fn from_requested(grading: &GradingSystem, requested: &[String]) -> Option<Self> {
        let requested: Vec<&str> = requested
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();
        if requested.is_empty() || requested.contains(&ALL) {
            return None;
        }

        let mut selection = Self::default();
        for grade in requested {
            if let Some(common) = grading.common_grade(grade) {
                selection.push_values(&common.values);
                if let Some(range) = score_range(grading, grade) {
                    selection.push_range(range);
                }
            } else if let Some(bucket) = grading.score_buckets.iter().find(|b| b.label == grade) {
                selection.push_range(ScoreRange {
                    min: bucket.min,
                    max: bucket.max,
                });
            } else {
                selection.push_values(&[grade.to_string()]);
            }
        }
        Some(selection)
    }

    fn push_values(&mut self, values: &[String]) {
        for value in values {
            if !self.values.contains(value) {
                self.values.push(value.clone());
            }
        }
    }

    fn push_range(&mut self, range: ScoreRange) {
        if !self.score_ranges.contains(&range) {
            self.score_ranges.push(range);
        }
    }

    /// Returns `true` if an inspection with this grade and score is
    /// selected.
    #[must_use]
    pub fn accepts(&self, grade: &str, score: Option<i64>) -> bool {
        self.values.iter().any(|v| v == grade)
            || score.is_some_and(|s| self.score_ranges.iter().any(|r| r.contains(s)))
    }
}

/// One selectable grade with its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOption {
    /// Raw value as it appears in the source.
    pub value: String,
    /// Presentation descriptor.
    #[serde(flatten)]
    pub descriptor: GradeDescriptor,
}

/// Grading vocabulary summary for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingSystemInfo {
    /// Registry code.
    pub jurisdiction: String,
    /// Vocabulary family.
    pub kind: GradingKind,
    /// Prose summary.
    pub description: String,
    /// Score semantics, when a score is published.
    pub score_direction: Option<ScoreDirection>,
    /// Grades in display order.
    pub grades: Vec<GradeOption>,
    /// Risk levels in display order.
    pub risks: Vec<GradeOption>,
    /// Score bucket labels, best first.
    pub score_buckets: Vec<String>,
}

/// Builds the [`GradingSystemInfo`] for a jurisdiction.
#[must_use]
pub fn grading_system_info(config: &JurisdictionConfig) -> GradingSystemInfo {
    let grading = &config.grading;
    let options = |entries: &[restaurant_health_source_models::GradeEntry]| {
        entries
            .iter()
            .map(|e| GradeOption {
                value: e.value.clone(),
                descriptor: e.descriptor(),
            })
            .collect()
    };

    GradingSystemInfo {
        jurisdiction: config.id.clone(),
        kind: grading.kind,
        description: grading.description.clone(),
        score_direction: grading.score_direction,
        grades: options(&grading.grades),
        risks: options(&grading.risks),
        score_buckets: grading
            .score_buckets
            .iter()
            .map(|b| b.label.clone())
            .collect(),
    }
}
