//! Folds normalized rows into deduplicated restaurants.
//!
//! Rows arrive newest-first from the portal. The first row seen for an
//! identity seeds the restaurant's static fields; every row contributes its
//! inspection, merged by event so one-row-per-violation sources produce a
//! single inspection with several violations.

use std::collections::BTreeMap;

use restaurant_health_models::{Inspection, Restaurant, RestaurantFilters, RestaurantProfile};

/// Case-insensitive identity of a restaurant within one jurisdiction fetch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    name: String,
    address: String,
    license: Option<String>,
}

impl IdentityKey {
    /// Builds a key from trimmed, lower-cased parts.
    #[must_use]
    pub fn new(name: &str, address: &str, license: Option<&str>) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            address: address.trim().to_lowercase(),
            license: license.map(|l| l.trim().to_lowercase()),
        }
    }
}

/// One raw row after normalization.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    /// Dedup key.
    pub key: IdentityKey,
    /// Static fields.
    pub profile: RestaurantProfile,
    /// The inspection the row describes.
    pub inspection: Inspection,
}

struct Entry {
    profile: RestaurantProfile,
    inspections: Vec<Inspection>,
}

/// Accumulates rows across pages.
pub struct RestaurantFold {
    history: bool,
    order: Vec<IdentityKey>,
    entries: BTreeMap<IdentityKey, Entry>,
    matching: usize,
}

impl RestaurantFold {
    /// Creates an empty fold. With `history == false` only the first
    /// inspection event per restaurant is kept.
    #[must_use]
    pub const fn new(history: bool) -> Self {
        Self {
            history,
            order: Vec::new(),
            entries: BTreeMap::new(),
            matching: 0,
        }
    }

    /// Adds one row.
    pub fn push(&mut self, row: NormalizedRow, filters: &RestaurantFilters) {
        let NormalizedRow {
            key,
            profile,
            inspection,
        } = row;

        if let Some(entry) = self.entries.get_mut(&key) {
            if let Some(existing) = entry
                .inspections
                .iter_mut()
                .find(|i| same_event(i, &inspection))
            {
                existing.absorb(inspection);
            } else if self.history {
                entry.inspections.push(inspection);
            } else {
                log::trace!("skipping older inspection for {}", entry.profile.name);
            }
            return;
        }

        if filters.accepts_cuisine(&profile.cuisine_type) {
            self.matching += 1;
        }
        self.order.push(key.clone());
        self.entries.insert(
            key,
            Entry {
                profile,
                inspections: vec![inspection],
            },
        );
    }

    /// Restaurants seen so far that pass the cuisine filter.
    #[must_use]
    pub const fn matching(&self) -> usize {
        self.matching
    }

    /// Restaurants seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no rows have been folded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Builds the restaurants in first-seen order, applying the cuisine
    /// filter and the limit.
    #[must_use]
    pub fn finish(mut self, filters: &RestaurantFilters) -> Vec<Restaurant> {
        self.order
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|entry| filters.accepts_cuisine(&entry.profile.cuisine_type))
            .filter_map(|entry| Restaurant::from_inspections(entry.profile, entry.inspections))
            .take(filters.limit)
            .collect()
    }
}

fn same_event(a: &Inspection, b: &Inspection) -> bool {
    a.inspection_date == b.inspection_date && a.inspection_type == b.inspection_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use restaurant_health_models::NO_VIOLATIONS;

    fn profile(name: &str, cuisine: &str) -> RestaurantProfile {
        RestaurantProfile {
            id: format!("test_{name}"),
            jurisdiction: "test".to_string(),
            name: name.to_string(),
            address: "1 Main St".to_string(),
            cuisine_type: cuisine.to_string(),
            boro: String::new(),
            phone: String::new(),
            license: None,
        }
    }

    fn inspection(date: &str, violation: &str) -> Inspection {
        Inspection {
            grade: "A".to_string(),
            score: Some(10),
            inspection_date: date.to_string(),
            violations: vec![violation.to_string()],
            inspection_type: "Routine".to_string(),
            critical_flag: None,
            risk_level: None,
        }
    }

    fn row(name: &str, cuisine: &str, date: &str, violation: &str) -> NormalizedRow {
        NormalizedRow {
            key: IdentityKey::new(name, "1 Main St", None),
            profile: profile(name, cuisine),
            inspection: inspection(date, violation),
        }
    }

    #[test]
    fn identity_is_case_insensitive() {
        assert_eq!(
            IdentityKey::new("Joe's Pizza ", "1 MAIN ST", Some("ABC")),
            IdentityKey::new("JOE'S PIZZA", "1 main st", Some("abc"))
        );
        assert_ne!(
            IdentityKey::new("Joe's", "1 Main", Some("1")),
            IdentityKey::new("Joe's", "1 Main", Some("2"))
        );
    }

    #[test]
    fn rows_of_same_event_merge_violations() {
        let filters = RestaurantFilters::default();
        let mut fold = RestaurantFold::new(true);
        fold.push(row("Joe's", "Pizza", "2024-03-15", "mice"), &filters);
        fold.push(row("JOE'S", "Pizza", "2024-03-15", "flies"), &filters);
        fold.push(row("Joe's", "Pizza", "2024-01-10", NO_VIOLATIONS), &filters);

        let restaurants = fold.finish(&filters);
        assert_eq!(restaurants.len(), 1);
        let r = &restaurants[0];
        assert_eq!(r.inspections.len(), 2);
        assert_eq!(r.inspections[0].violations, vec!["mice", "flies"]);
        assert_eq!(r.inspection_date, "2024-03-15");
        assert_eq!(r.inspections[1].inspection_date, "2024-01-10");
    }

    #[test]
    fn latest_only_skips_older_events() {
        let filters = RestaurantFilters::default();
        let mut fold = RestaurantFold::new(false);
        fold.push(row("Joe's", "Pizza", "2024-03-15", "mice"), &filters);
        fold.push(row("Joe's", "Pizza", "2023-03-15", "flies"), &filters);
        let restaurants = fold.finish(&filters);
        assert_eq!(restaurants[0].inspections.len(), 1);
        assert_eq!(restaurants[0].violations, vec!["mice"]);
    }

    #[test]
    fn cuisine_filter_and_limit_preserve_first_seen_order() {
        let filters = RestaurantFilters {
            cuisines: vec!["Pizza".to_string()],
            limit: 2,
            ..RestaurantFilters::default()
        };
        let mut fold = RestaurantFold::new(true);
        fold.push(row("Zed's", "Pizza", "2024-03-15", NO_VIOLATIONS), &filters);
        fold.push(row("Amy's", "Thai", "2024-03-14", NO_VIOLATIONS), &filters);
        fold.push(row("Bob's", "Pizza", "2024-03-13", NO_VIOLATIONS), &filters);
        fold.push(row("Cal's", "Pizza", "2024-03-12", NO_VIOLATIONS), &filters);
        assert_eq!(fold.len(), 4);
        assert_eq!(fold.matching(), 3);

        let names: Vec<String> = fold.finish(&filters).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Zed's", "Bob's"]);
    }
}
