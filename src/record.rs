//! Movie records and the result sets they are collected into
//!
//! A [`ResultSet`] is what one surface (API or UI) returned for one set of
//! filters. Records keep the order the source reported them in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which surface produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    Ui,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Api => write!(f, "API"),
            Source::Ui => write!(f, "UI"),
        }
    }
}

/// Sort keys understood by the discover endpoint and page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    ReleaseDateAsc,
    ReleaseDateDesc,
}

impl SortKey {
    pub fn as_query(&self) -> &'static str {
        match self {
            SortKey::ReleaseDateAsc => "primary_release_date.asc",
            SortKey::ReleaseDateDesc => "primary_release_date.desc",
        }
    }
}

/// Filters a result set was fetched with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Genre id (e.g. 18 for Drama)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<i64>,

    /// Inclusive lower release-date bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,

    /// Inclusive upper release-date bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,

    pub sort: SortKey,

    /// Number of pages requested from the source
    pub pages: u32,
}

impl FilterParams {
    /// Filters covering whole calendar years, the way the Discover page is driven
    pub fn for_years(genre_id: Option<i64>, from_year: i32, to_year: i32, pages: u32) -> Self {
        Self {
            genre_id,
            from: NaiveDate::from_ymd_opt(from_year, 1, 1),
            to: NaiveDate::from_ymd_opt(to_year, 12, 31),
            sort: SortKey::ReleaseDateAsc,
            pages,
        }
    }
}

/// Case- and whitespace-folded title used for equality only
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn from_title(title: &str) -> Self {
        Self(title.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One movie as reported by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub genre_ids: BTreeSet<i64>,
}

impl Record {
    pub fn key(&self) -> NormalizedKey {
        NormalizedKey::from_title(&self.title)
    }
}

/// Ordered, source-tagged records from one fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub source: Source,
    pub filter: FilterParams,
    pub records: Vec<Record>,
}

impl ResultSet {
    pub fn new(source: Source, filter: FilterParams, records: Vec<Record>) -> Self {
        Self {
            source,
            filter,
            records,
        }
    }

    pub fn empty(source: Source) -> Self {
        Self::new(source, FilterParams::default(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct normalized keys of every record
    pub fn keys(&self) -> BTreeSet<NormalizedKey> {
        self.records.iter().map(Record::key).collect()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.title.as_str())
    }

    /// Records that carry a parsed release date, in sequence order
    pub fn dated(&self) -> impl Iterator<Item = (&Record, NaiveDate)> {
        self.records
            .iter()
            .filter_map(|r| r.release_date.map(|d| (r, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_key_folds_case_and_whitespace() {
        assert_eq!(
            NormalizedKey::from_title("  The Matrix \t"),
            NormalizedKey::from_title("the matrix")
        );
        assert_eq!(NormalizedKey::from_title(" Up ").as_str(), "up");
    }

    #[test]
    fn test_filter_for_years_covers_whole_years() {
        let filter = FilterParams::for_years(Some(18), 1990, 2005, 2);
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2005, 12, 31));
        assert_eq!(filter.sort.as_query(), "primary_release_date.asc");
    }

    #[test]
    fn test_keys_deduplicate() {
        let rec = |t: &str| Record {
            title: t.to_string(),
            release_date: None,
            genre_ids: BTreeSet::new(),
        };
        let set = ResultSet::new(
            Source::Ui,
            FilterParams::default(),
            vec![rec("Heat"), rec("HEAT"), rec("Casino")],
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.keys().len(), 2);
    }
}
