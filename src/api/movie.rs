//! Discover endpoint
//!
//! When the endpoint rejects a filtered query, the page is fetched again
//! without date and genre filters and the filtering and sorting are applied
//! locally.

use super::TmdbClient;
use crate::error::{ParityError, Result};
use crate::normalize::{Normalizer, ISO_DATE_FORMAT};
use crate::record::{FilterParams, ResultSet, SortKey, Source};
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

pub struct MovieApi {
    client: TmdbClient,
}

struct DiscoverPageResult {
    /// Items the endpoint returned before any local filtering
    upstream: usize,
    kept: Vec<Value>,
}

impl MovieApi {
    pub fn new(client: TmdbClient) -> Self {
        Self { client }
    }

    fn query_for(filter: &FilterParams, page: u32, with_filters: bool) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("sort_by", filter.sort.as_query().to_string()),
            ("page", page.to_string()),
        ];
        if with_filters {
            if let Some(genre) = filter.genre_id {
                query.push(("with_genres", genre.to_string()));
            }
            if let Some(from) = filter.from {
                query.push(("primary_release_date.gte", from.format(ISO_DATE_FORMAT).to_string()));
            }
            if let Some(to) = filter.to {
                query.push(("primary_release_date.lte", to.format(ISO_DATE_FORMAT).to_string()));
            }
        }
        query
    }

    async fn results_page(&self, query: &[(&str, String)]) -> Result<Vec<Value>> {
        let mut body = self.client.get_json("/discover/movie", query).await?;
        match body.get_mut("results").map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(ParityError::InvalidResponse(format!(
                "discover results is not a list: {}",
                other
            ))),
            None => Err(ParityError::InvalidResponse(
                "discover response has no results field".to_string(),
            )),
        }
    }

    /// One page of raw discover results
    pub async fn discover(&self, filter: &FilterParams, page: u32) -> Result<Vec<Value>> {
        Ok(self.discover_page(filter, page).await?.kept)
    }

    async fn discover_page(&self, filter: &FilterParams, page: u32) -> Result<DiscoverPageResult> {
        let query = Self::query_for(filter, page, true);
        match self.results_page(&query).await {
            Ok(items) => Ok(DiscoverPageResult {
                upstream: items.len(),
                kept: items,
            }),
            Err(e) if e.is_rejected_query() => {
                log::warn!(
                    "Discover rejected filtered query for page {} ({}), filtering locally",
                    page,
                    e
                );
                let query = Self::query_for(filter, page, false);
                let items = self.results_page(&query).await?;
                Ok(DiscoverPageResult {
                    upstream: items.len(),
                    kept: apply_client_filter(items, filter),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Pages `1..=filter.pages`, stopping once the endpoint runs out of results
    ///
    /// A page that local filtering empties does not end the walk; later
    /// unfiltered pages may still hold matching movies.
    pub async fn discover_all_pages(&self, filter: &FilterParams) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        for page in 1..=filter.pages.max(1) {
            let result = self.discover_page(filter, page).await?;
            log::debug!(
                "Discover page {} returned {} movies, kept {}",
                page,
                result.upstream,
                result.kept.len()
            );
            if result.upstream == 0 {
                break;
            }
            all.extend(result.kept);
        }
        log::info!("API returned {} movies", all.len());
        Ok(all)
    }

    /// Fetch and normalize into an API result set
    pub async fn fetch_result_set(
        &self,
        filter: &FilterParams,
        normalizer: &Normalizer,
    ) -> Result<ResultSet> {
        let items = self.discover_all_pages(filter).await?;
        normalizer.normalize(&Value::Array(items), Source::Api, filter.clone())
    }
}

fn release_date_of(item: &Value) -> Option<NaiveDate> {
    item.get("release_date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT).ok())
}

fn has_genre(item: &Value, genre: i64) -> bool {
    item.get("genre_ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter().any(|id| match id {
                Value::Number(n) => n.as_i64() == Some(genre),
                Value::String(s) => s.trim().parse::<i64>().ok() == Some(genre),
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// Filter and sort raw discover results the way the endpoint would have
///
/// Records without a parseable date are dropped when a date bound is set,
/// and sorted last otherwise.
pub fn apply_client_filter(items: Vec<Value>, filter: &FilterParams) -> Vec<Value> {
    let mut kept: Vec<Value> = items
        .into_iter()
        .filter(|item| filter.genre_id.map_or(true, |g| has_genre(item, g)))
        .filter(|item| {
            if filter.from.is_none() && filter.to.is_none() {
                return true;
            }
            match release_date_of(item) {
                Some(date) => {
                    filter.from.map_or(true, |from| date >= from)
                        && filter.to.map_or(true, |to| date <= to)
                }
                None => false,
            }
        })
        .collect();

    kept.sort_by(|a, b| match (release_date_of(a), release_date_of(b)) {
        (Some(x), Some(y)) => match filter.sort {
            SortKey::ReleaseDateAsc => x.cmp(&y),
            SortKey::ReleaseDateDesc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    kept
}
