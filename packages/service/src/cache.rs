//! Short-lived in-memory result cache.
//!
//! Entries are keyed by jurisdiction plus the complete filter set (limit
//! included) and expire after a fixed TTL. Expired entries count as misses
//! and are dropped on lookup. Only successful fetches are stored.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use restaurant_health_models::{Restaurant, RestaurantFilters};

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Environment variable overriding the TTL, in seconds.
pub const CACHE_TTL_ENV: &str = "HEALTH_INSPECT_CACHE_TTL_SECS";

/// Cache key: jurisdiction code plus every filter field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    /// Jurisdiction code.
    pub jurisdiction: String,
    /// Complete filter set.
    pub filters: RestaurantFilters,
}

impl CacheKey {
    /// Builds a key.
    #[must_use]
    pub fn new(jurisdiction: &str, filters: &RestaurantFilters) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            filters: filters.clone(),
        }
    }
}

struct Entry<T> {
    stored_at: Instant,
    value: T,
}

type Table<K, V> = Mutex<BTreeMap<K, Entry<V>>>;

/// TTL cache of restaurant lists and location lists.
pub struct ResultCache {
    ttl: Duration,
    restaurants: Table<CacheKey, Arc<[Restaurant]>>,
    locations: Table<String, Arc<[String]>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            restaurants: Mutex::new(BTreeMap::new()),
            locations: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates a cache whose TTL comes from [`CACHE_TTL_ENV`], falling back
    /// to [`DEFAULT_TTL`] when unset or invalid.
    #[must_use]
    pub fn from_env() -> Self {
        let ttl = match std::env::var(CACHE_TTL_ENV) {
            Ok(raw) => raw.trim().parse::<u64>().map_or_else(
                |e| {
                    log::warn!("Ignoring invalid {CACHE_TTL_ENV}={raw:?}: {e}");
                    DEFAULT_TTL
                },
                Duration::from_secs,
            ),
            Err(_) => DEFAULT_TTL,
        };
        Self::new(ttl)
    }

    /// The configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached restaurants for `(jurisdiction, filters)` if
    /// present and fresh.
    #[must_use]
    pub fn get(&self, jurisdiction: &str, filters: &RestaurantFilters) -> Option<Arc<[Restaurant]>> {
        lookup(&self.restaurants, &CacheKey::new(jurisdiction, filters), self.ttl)
    }

    /// Stores restaurants and returns the shared snapshot.
    pub fn put(
        &self,
        jurisdiction: &str,
        filters: &RestaurantFilters,
        restaurants: Vec<Restaurant>,
    ) -> Arc<[Restaurant]> {
        let value: Arc<[Restaurant]> = restaurants.into();
        store(
            &self.restaurants,
            CacheKey::new(jurisdiction, filters),
            Arc::clone(&value),
        );
        value
    }

    /// Returns the cached location list for `jurisdiction`.
    #[must_use]
    pub fn get_locations(&self, jurisdiction: &str) -> Option<Arc<[String]>> {
        lookup(&self.locations, &jurisdiction.to_string(), self.ttl)
    }

    /// Stores a location list and returns the shared snapshot.
    pub fn put_locations(&self, jurisdiction: &str, locations: Vec<String>) -> Arc<[String]> {
        let value: Arc<[String]> = locations.into();
        store(&self.locations, jurisdiction.to_string(), Arc::clone(&value));
        value
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&self.restaurants, self.ttl) + purge(&self.locations, self.ttl)
    }

    /// Drops everything.
    pub fn clear(&self) {
        self.restaurants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.locations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached restaurant lists, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.restaurants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no restaurant lists are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lookup<K: Ord, V: Clone>(table: &Table<K, V>, key: &K, ttl: Duration) -> Option<V> {
    let mut map = table.lock().unwrap_or_else(PoisonError::into_inner);
    match map.get(key) {
        Some(entry) if entry.stored_at.elapsed() < ttl => Some(entry.value.clone()),
        Some(_) => {
            map.remove(key);
            None
        }
        None => None,
    }
}

fn store<K: Ord, V>(table: &Table<K, V>, key: K, value: V) {
    table.lock().unwrap_or_else(PoisonError::into_inner).insert(
        key,
        Entry {
            stored_at: Instant::now(),
            value,
        },
    );
}

fn purge<K: Ord, V>(table: &Table<K, V>, ttl: Duration) -> usize {
    let mut map = table.lock().unwrap_or_else(PoisonError::into_inner);
    let before = map.len();
    map.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    before - map.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(limit: usize) -> RestaurantFilters {
        RestaurantFilters {
            limit,
            ..RestaurantFilters::default()
        }
    }

    #[test]
    fn hit_after_put() {
        let cache = ResultCache::default();
        assert_eq!(cache.ttl(), DEFAULT_TTL);
        cache.put("nyc", &filters(10), Vec::new());
        assert!(cache.get("nyc", &filters(10)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn key_includes_limit_and_jurisdiction() {
        let cache = ResultCache::default();
        cache.put("nyc", &filters(10), Vec::new());
        assert!(cache.get("nyc", &filters(11)).is_none());
        assert!(cache.get("chicago", &filters(10)).is_none());
    }

    #[test]
    fn zero_ttl_entries_are_always_expired() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.put("nyc", &filters(10), Vec::new());
        assert!(cache.get("nyc", &filters(10)).is_none());
        assert!(cache.is_empty(), "expired entry should be removed on lookup");

        cache.put_locations("nyc", vec!["Queens".to_string()]);
        cache.put("nyc", &filters(10), Vec::new());
        assert_eq!(cache.purge_expired(), 2);
    }

    #[test]
    fn locations_are_cached_separately() {
        let cache = ResultCache::default();
        cache.put_locations("nyc", vec!["Queens".to_string()]);
        assert_eq!(cache.get_locations("nyc").unwrap().as_ref(), ["Queens"]);
        assert!(cache.is_empty());
        cache.clear();
        assert!(cache.get_locations("nyc").is_none());
    }
}
