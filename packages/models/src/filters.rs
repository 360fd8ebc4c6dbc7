//! Search criteria accepted by every jurisdiction adapter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel meaning "no restriction" for location and cuisine selections.
pub const ALL: &str = "All";

/// Default maximum number of restaurants returned per call.
pub const DEFAULT_LIMIT: usize = 1000;

/// Inclusive inspection date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Returns `true` if a normalized `YYYY-MM-DD` date lies within the
    /// range. Unparseable dates never match.
    #[must_use]
    pub fn contains(&self, date: &str) -> bool {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .is_ok_and(|d| d >= self.start && d <= self.end)
    }
}

/// How a user-supplied search term should match restaurant names.
///
/// All modes are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Name contains the term.
    Substring(String),
    /// Name equals the term. Requested by wrapping the term in double quotes.
    Exact(String),
    /// Name starts with the term. Requested by a trailing `*`.
    Prefix(String),
}

impl SearchTerm {
    /// Interprets raw search input.
    ///
    /// A leading and trailing `"` selects [`Self::Exact`]; otherwise a
    /// trailing `*` selects [`Self::Prefix`]; otherwise [`Self::Substring`].
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            let inner = trimmed[1..trimmed.len() - 1].trim();
            return (!inner.is_empty()).then(|| Self::Exact(inner.to_string()));
        }

        if let Some(stem) = trimmed.strip_suffix('*') {
            let stem = stem.trim_end_matches('*').trim();
            return (!stem.is_empty()).then(|| Self::Prefix(stem.to_string()));
        }

        Some(Self::Substring(trimmed.to_string()))
    }

    /// The term without any mode markers.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Substring(v) | Self::Exact(v) | Self::Prefix(v) => v,
        }
    }

    /// Applies the match mode to a restaurant name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim().to_uppercase();
        let term = self.value().to_uppercase();
        match self {
            Self::Substring(_) => name.contains(&term),
            Self::Exact(_) => name == term,
            Self::Prefix(_) => name.starts_with(&term),
        }
    }
}

/// Restaurant search criteria.
///
/// Every field participates in result-cache keys, including `limit`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantFilters {
    /// Area to match exactly, or `"All"`.
    pub location: Option<String>,
    /// Common letter grades (`"A"`, `"B"`, `"C"`) or jurisdiction-native
    /// grade values.
    pub grades: Vec<String>,
    /// Cuisine types to keep. Empty or containing `"All"` keeps everything.
    pub cuisines: Vec<String>,
    /// Raw search input (see [`SearchTerm::parse`]).
    pub search_term: Option<String>,
    /// Inclusive inspection date bounds.
    pub date_range: Option<DateRange>,
    /// Maximum number of restaurants to return.
    pub limit: usize,
}

impl Default for RestaurantFilters {
    fn default() -> Self {
        Self {
            location: None,
            grades: Vec::new(),
            cuisines: Vec::new(),
            search_term: None,
            date_range: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RestaurantFilters {
    /// Location to filter on, or `None` when unset, blank, or `"All"`.
    #[must_use]
    pub fn location_filter(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != ALL)
    }

    /// Parsed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<SearchTerm> {
        self.search_term.as_deref().and_then(SearchTerm::parse)
    }

    /// Returns `true` if a restaurant with this cuisine passes the cuisine
    /// filter.
    #[must_use]
    pub fn accepts_cuisine(&self, cuisine: &str) -> bool {
        self.cuisines.is_empty()
            || self.cuisines.iter().any(|c| c == ALL)
            || self.cuisines.iter().any(|c| c == cuisine)
    }
}
