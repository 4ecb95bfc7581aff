//! Ordered element locators
//!
//! A [`LocatorChain`] holds candidate CSS selectors in priority order. Each
//! candidate is probed in turn and yields an optional match; the first match
//! wins. Probes never throw to signal "not here", they return `None`.

use serde::Serialize;
use std::future::Future;

/// One candidate way of finding an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorStrategy {
    pub label: String,
    pub css: String,
}

impl LocatorStrategy {
    pub fn css(label: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            css: css.into(),
        }
    }
}

/// The strategy that matched and what its probe produced
#[derive(Debug, Clone, PartialEq)]
pub struct Located<'a, T> {
    pub strategy: &'a LocatorStrategy,
    pub index: usize,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorChain {
    pub name: String,
    pub strategies: Vec<LocatorStrategy>,
}

impl LocatorChain {
    pub fn new(name: impl Into<String>, strategies: Vec<LocatorStrategy>) -> Self {
        Self {
            name: name.into(),
            strategies,
        }
    }

    /// Movie cards on the Discover page
    pub fn movie_cards() -> Self {
        Self::new(
            "movie cards",
            vec![
                LocatorStrategy::css("styled card", ".card.style_1"),
                LocatorStrategy::css("test id", "[data-testid=movie-card]"),
                LocatorStrategy::css("any card", ".card"),
            ],
        )
    }

    /// Title link inside a card
    pub fn card_title() -> Self {
        Self::new(
            "card title",
            vec![
                LocatorStrategy::css("h2 link", "h2 a"),
                LocatorStrategy::css("h3 link", "h3 a"),
                LocatorStrategy::css("title link", ".title a"),
                LocatorStrategy::css("h2", "h2"),
            ],
        )
    }

    /// Release date text inside a card
    pub fn card_release_date() -> Self {
        Self::new(
            "card release date",
            vec![
                LocatorStrategy::css("release date", ".release_date"),
                LocatorStrategy::css("content paragraph", ".content p"),
                LocatorStrategy::css("paragraph", "p"),
            ],
        )
    }

    pub fn selectors(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.css.as_str()).collect()
    }

    /// First strategy for which `probe` resolves to `Some`; probes run one at a time, in order
    pub async fn resolve<'a, T, F, Fut>(&'a self, mut probe: F) -> Option<Located<'a, T>>
    where
        F: FnMut(&'a LocatorStrategy) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for (index, strategy) in self.strategies.iter().enumerate() {
            if let Some(value) = probe(strategy).await {
                log::debug!("{}: matched with {} ({})", self.name, strategy.label, strategy.css);
                return Some(Located {
                    strategy,
                    index,
                    value,
                });
            }
            log::debug!("{}: no match for {} ({})", self.name, strategy.label, strategy.css);
        }
        None
    }
}
