//! Page object for the Discover movie listing
//!
//! Filters are applied through the query string, then the page is read once
//! the first movie card is present.

use super::chrome::{ChromeDriver, DEFAULT_POLL_INTERVAL};
use super::locator::LocatorChain;
use crate::error::{ParityError, Result};
use crate::normalize::{Normalizer, RawRecord};
use crate::record::{FilterParams, ResultSet, SortKey, Source};
use reqwest::Url;
use serde_json::Value;

/// Cards read from the page when no limit is configured
pub const DEFAULT_CARD_LIMIT: usize = 10;

pub struct DiscoverPage<'a> {
    driver: &'a ChromeDriver,
    base_url: String,
    cards: LocatorChain,
    title: LocatorChain,
    release_date: LocatorChain,
}

impl<'a> DiscoverPage<'a> {
    pub fn new(driver: &'a ChromeDriver, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            cards: LocatorChain::movie_cards(),
            title: LocatorChain::card_title(),
            release_date: LocatorChain::card_release_date(),
        }
    }

    /// Discover URL with the filters encoded in the query string
    pub fn discover_url(base: &str, genre_id: i64, from_year: i32, to_year: i32) -> Result<String> {
        let page = format!("{}/discover/movie", base.trim_end_matches('/'));
        let url = Url::parse_with_params(
            &page,
            &[
                ("sort_by", SortKey::ReleaseDateAsc.as_query().to_string()),
                ("primary_release_date.gte", format!("{}-01-01", from_year)),
                ("primary_release_date.lte", format!("{}-12-31", to_year)),
                ("with_genres", genre_id.to_string()),
            ],
        )
        .map_err(|e| ParityError::InvalidConfig(format!("ui.discover_url {:?}: {}", base, e)))?;
        Ok(url.to_string())
    }

    fn any_card_present_js(&self) -> Result<String> {
        let selectors = serde_json::to_string(&self.cards.selectors())?;
        Ok(format!(
            "{}.some(s => document.querySelector(s) !== null)",
            selectors
        ))
    }

    /// Navigate with filters applied and wait until a movie card is rendered
    pub async fn open_with_filters(&self, genre_id: i64, from_year: i32, to_year: i32) -> Result<()> {
        let url = Self::discover_url(&self.base_url, genre_id, from_year, to_year)?;
        self.driver.navigate(&url).await?;
        self.driver
            .wait_for(
                &self.any_card_present_js()?,
                self.driver.page_timeout(),
                DEFAULT_POLL_INTERVAL,
            )
            .await
    }

    /// Raw records from the first `limit` cards; cards without a title come back with a null title
    pub async fn movie_cards(&self, limit: usize) -> Result<Vec<RawRecord>> {
        let driver = self.driver;
        let located = self
            .cards
            .resolve(|strategy| async move {
                let css = serde_json::to_string(&strategy.css).ok()?;
                let count: usize = driver
                    .execute_script_typed(&format!("document.querySelectorAll({}).length", css))
                    .await
                    .ok()?;
                (count > 0).then_some(count)
            })
            .await;

        let Some(located) = located else {
            log::warn!("No movie cards found with any of {:?}", self.cards.selectors());
            return Ok(Vec::new());
        };
        log::info!(
            "Found {} cards using {}",
            located.value,
            located.strategy.label
        );

        let script = format!(
            r#"(() => {{
                const titleSelectors = {titles};
                const dateSelectors = {dates};
                const pick = (card, selectors) => {{
                    for (const s of selectors) {{
                        const el = card.querySelector(s);
                        if (el && el.textContent.trim()) return el.textContent.trim();
                    }}
                    return null;
                }};
                return Array.from(document.querySelectorAll({card}))
                    .slice(0, {limit})
                    .map(card => ({{
                        title: pick(card, titleSelectors),
                        release_date: pick(card, dateSelectors),
                        genre_ids: []
                    }}));
            }})()"#,
            titles = serde_json::to_string(&self.title.selectors())?,
            dates = serde_json::to_string(&self.release_date.selectors())?,
            card = serde_json::to_string(&located.strategy.css)?,
            limit = limit,
        );

        let raw: Value = self.driver.execute_script_typed(&script).await?;
        let records = RawRecord::list_from_value(&raw)?;
        for record in &records {
            log::debug!("Card: {:?} ({:?})", record.title, record.release_date);
        }
        Ok(records)
    }

    /// Trimmed, non-empty titles of the first `limit` cards
    pub async fn movie_titles(&self, limit: usize) -> Result<Vec<String>> {
        let raw = self.movie_cards(limit).await?;
        Ok(raw
            .iter()
            .filter_map(|r| r.title.as_deref().map(str::trim))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Open the page with filters and normalize its cards into a UI result set
    pub async fn fetch_result_set(
        &self,
        genre_id: i64,
        from_year: i32,
        to_year: i32,
        limit: usize,
        normalizer: &Normalizer,
    ) -> Result<ResultSet> {
        self.open_with_filters(genre_id, from_year, to_year).await?;
        let raw = self.movie_cards(limit).await?;
        let filter = FilterParams::for_years(Some(genre_id), from_year, to_year, 1);
        Ok(normalizer.normalize_records(&raw, Source::Ui, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_url() {
        let url = DiscoverPage::discover_url("https://www.themoviedb.org/", 18, 1990, 2005).unwrap();
        assert_eq!(
            url,
            "https://www.themoviedb.org/discover/movie?sort_by=primary_release_date.asc\
             &primary_release_date.gte=1990-01-01&primary_release_date.lte=2005-12-31&with_genres=18"
        );
    }

    #[test]
    fn test_discover_url_rejects_bad_base() {
        assert!(DiscoverPage::discover_url("not a url", 18, 1990, 2005).is_err());
    }
}
