//! Shared fetch driver.
//!
//! Translates [`RestaurantFilters`] into the jurisdiction's API dialect,
//! pages through results with a [`JsonClient`], normalizes each row with the
//! jurisdiction's [`JurisdictionAdapter`], and folds rows into
//! deduplicated restaurants.

use std::time::Duration;

use restaurant_health_models::{Restaurant, RestaurantFilters, SearchTerm};
use restaurant_health_source_models::{FetcherConfig, JurisdictionConfig};

use crate::ckan::{self, RowFilter};
use crate::grading::GradeSelection;
use crate::normalize::{NormalizedRow, RestaurantFold};
use crate::parsing::get_string;
use crate::socrata;
use crate::{JsonClient, JurisdictionAdapter, SourceError};

/// A filter set rendered in one API dialect.
enum NativeQuery<'a> {
    Socrata {
        date_column: &'a str,
        where_expr: Option<String>,
    },
    Ckan {
        resource_id: &'a str,
        date_column: &'a str,
        search: Option<SearchTerm>,
        filters: Option<serde_json::Map<String, serde_json::Value>>,
        row_filter: RowFilter,
    },
}

impl<'a> NativeQuery<'a> {
    /// Renders the filters, or returns `None` when the requested grades
    /// cannot match anything the dialect can select.
    fn build(config: &'a JurisdictionConfig, filters: &RestaurantFilters) -> Option<Self> {
        let selection = GradeSelection::from_requested(&config.grading, &filters.grades);
        Some(match &config.fetcher {
            FetcherConfig::Socrata {
                date_column,
                base_where,
                ..
            } => {
                if let Some(selection) = &selection
                    && socrata::grade_clause(config, selection).is_none()
                {
                    return None;
                }
                Self::Socrata {
                    date_column,
                    where_expr: socrata::where_clause(
                        config,
                        base_where.as_deref(),
                        filters,
                        selection.as_ref(),
                    ),
                }
            }
            FetcherConfig::Ckan {
                resource_id,
                date_column,
                ..
            } => Self::Ckan {
                resource_id,
                date_column,
                search: filters.search(),
                filters: ckan::filters_object(config, filters, selection.as_ref()),
                row_filter: RowFilter::new(filters, selection),
            },
        })
    }

    fn page_params(&self, limit: u64, offset: u64) -> Result<Vec<(String, String)>, SourceError> {
        match self {
            Self::Socrata {
                date_column,
                where_expr,
            } => Ok(socrata::page_params(
                date_column,
                where_expr.as_deref(),
                limit,
                offset,
            )),
            Self::Ckan {
                resource_id,
                date_column,
                search,
                filters,
                ..
            } => ckan::page_params(
                resource_id,
                date_column,
                search.as_ref(),
                filters.as_ref(),
                limit,
                offset,
            ),
        }
    }

    fn rows(
        &self,
        body: serde_json::Value,
        url: &str,
    ) -> Result<Vec<serde_json::Value>, SourceError> {
        match self {
            Self::Socrata { .. } => socrata::rows(body, url),
            Self::Ckan { .. } => ckan::records(body, url),
        }
    }

    fn accepts(&self, row: &NormalizedRow) -> bool {
        match self {
            Self::Socrata { .. } => true,
            Self::Ckan { row_filter, .. } => row_filter.accepts(row),
        }
    }
}

/// Fetches, normalizes, and deduplicates restaurants for one jurisdiction.
///
/// Pages until the configured `max_records` ceiling, a short page, or
/// `filters.limit` restaurants passing the cuisine filter have been seen.
/// The result preserves first-seen (newest-first) order.
///
/// # Errors
///
/// Propagates any [`SourceError`] from the client or from response shape
/// validation. An empty source response is `Ok(vec![])`.
pub async fn fetch_restaurants(
    adapter: &dyn JurisdictionAdapter,
    client: &dyn JsonClient,
    filters: &RestaurantFilters,
) -> Result<Vec<Restaurant>, SourceError> {
    if filters.limit == 0 {
        return Ok(Vec::new());
    }

    let config = adapter.config();
    let fetcher = &config.fetcher;
    let url = fetcher.api_url();
    let Some(query) = NativeQuery::build(config, filters) else {
        log::debug!(
            "{}: requested grades {:?} match nothing in its grading system",
            config.name,
            filters.grades
        );
        return Ok(Vec::new());
    };
    let mut fold = RestaurantFold::new(config.history);
    let mut offset: u64 = 0;

    loop {
        let remaining = fetcher.max_records().saturating_sub(offset);
        if remaining == 0 {
            log::info!(
                "{}: reached the {} record ceiling",
                config.name,
                fetcher.max_records()
            );
            break;
        }
        let page_limit = remaining.min(fetcher.page_size());

        log::info!("Fetching {} data: offset={offset}, limit={page_limit}", config.name);
        let params = query.page_params(page_limit, offset)?;
        let body = client.request(url, &params, config.auth.as_ref()).await?;
        let rows = query.rows(body, url)?;
        let count = rows.len() as u64;

        for row in &rows {
            if let Some(normalized) = adapter.normalize_row(row)
                && query.accepts(&normalized)
            {
                fold.push(normalized, filters);
            }
        }
        offset += count;

        if count < page_limit {
            break;
        }
        if fold.matching() >= filters.limit {
            break;
        }
        if let Some(ms) = fetcher.delay_ms().filter(|ms| *ms > 0) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    let restaurants = fold.finish(filters);
    log::info!(
        "{}: {} restaurants from {offset} records",
        config.name,
        restaurants.len()
    );
    Ok(restaurants)
}

/// Lists the location values offered by a jurisdiction.
///
/// Blank values and `"0"` are dropped, configured defaults are merged in,
/// and the result is sorted and deduplicated. Jurisdictions without a
/// location field return their defaults without a request.
///
/// # Errors
///
/// Propagates any [`SourceError`] from the client.
pub async fn available_locations(
    adapter: &dyn JurisdictionAdapter,
    client: &dyn JsonClient,
) -> Result<Vec<String>, SourceError> {
    let config = adapter.config();
    let Some(field) = &config.fields.location else {
        return Ok(merge_locations(Vec::new(), &config.default_locations));
    };

    let url = config.fetcher.api_url();
    let rows = match &config.fetcher {
        FetcherConfig::Socrata { .. } => {
            let body = client
                .request(url, &socrata::distinct_params(field), config.auth.as_ref())
                .await?;
            socrata::rows(body, url)?
        }
        FetcherConfig::Ckan { resource_id, .. } => {
            let body = client
                .request(
                    url,
                    &ckan::distinct_params(resource_id, field),
                    config.auth.as_ref(),
                )
                .await?;
            ckan::records(body, url)?
        }
    };

    let found = rows.iter().filter_map(|row| get_string(row, field)).collect();
    Ok(merge_locations(found, &config.default_locations))
}

fn merge_locations(found: Vec<String>, defaults: &[String]) -> Vec<String> {
    let mut locations: Vec<String> = found
        .into_iter()
        .chain(defaults.iter().cloned())
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && l != "0")
        .collect();
    locations.sort();
    locations.dedup();
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_and_cleans_locations() {
        let found = vec![
            "Queens".to_string(),
            " ".to_string(),
            "0".to_string(),
            "Bronx ".to_string(),
        ];
        let defaults = vec!["Manhattan".to_string(), "Bronx".to_string()];
        assert_eq!(
            merge_locations(found, &defaults),
            vec!["Bronx", "Manhattan", "Queens"]
        );
    }
}
