//! Release-date range and ordering checks
//!
//! Records without a parsed release date are skipped by every check here.

use crate::record::ResultSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of out-of-range records at which the API date filter is considered broken
pub const MAX_OUT_OF_RANGE_RATIO: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    DateBelowRange,
    DateAboveRange,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::DateBelowRange => write!(f, "DATE_BELOW_RANGE"),
            ReasonCode::DateAboveRange => write!(f, "DATE_ABOVE_RANGE"),
        }
    }
}

/// One record whose release date falls outside the requested range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub record_title: String,
    pub reason_code: ReasonCode,
    pub detail: String,
}

pub fn validate_range(set: &ResultSet, from: NaiveDate, to: NaiveDate) -> Vec<Violation> {
    set.dated()
        .filter_map(|(record, date)| {
            let (reason_code, bound) = if date < from {
                (ReasonCode::DateBelowRange, from)
            } else if date > to {
                (ReasonCode::DateAboveRange, to)
            } else {
                return None;
            };
            Some(Violation {
                record_title: record.title.clone(),
                reason_code,
                detail: format!("released {}, bound {}", date, bound),
            })
        })
        .collect()
}

/// True when dated records never go backwards in sequence order
pub fn validate_ascending(set: &ResultSet) -> bool {
    let mut anchor: Option<NaiveDate> = None;
    for (_, date) in set.dated() {
        if let Some(prev) = anchor {
            if date < prev {
                return false;
            }
        }
        anchor = Some(date);
    }
    true
}

/// First adjacent pair (by dated records) that breaks ascending order
pub fn first_order_break(set: &ResultSet) -> Option<(String, NaiveDate, String, NaiveDate)> {
    let mut anchor: Option<(&str, NaiveDate)> = None;
    for (record, date) in set.dated() {
        if let Some((prev_title, prev)) = anchor {
            if date < prev {
                return Some((prev_title.to_string(), prev, record.title.clone(), date));
            }
        }
        anchor = Some((record.title.as_str(), date));
    }
    None
}

/// Out-of-range records over all records, 0 for an empty set
pub fn out_of_range_ratio(set: &ResultSet, from: NaiveDate, to: NaiveDate) -> f64 {
    if set.is_empty() {
        return 0.0;
    }
    validate_range(set, from, to).len() as f64 / set.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FilterParams, Record, Source};
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dated_set(dates: &[Option<&str>]) -> ResultSet {
        ResultSet::new(
            Source::Api,
            FilterParams::default(),
            dates
                .iter()
                .enumerate()
                .map(|(i, d)| Record {
                    title: format!("Movie {}", i),
                    release_date: d.map(date),
                    genre_ids: BTreeSet::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_range_flags_below_and_above() {
        let set = dated_set(&[Some("1985-01-01"), Some("1995-06-15"), Some("2010-12-31")]);
        let violations = validate_range(&set, date("1990-01-01"), date("2005-12-31"));

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].record_title, "Movie 0");
        assert_eq!(violations[0].reason_code, ReasonCode::DateBelowRange);
        assert_eq!(violations[1].record_title, "Movie 2");
        assert_eq!(violations[1].reason_code, ReasonCode::DateAboveRange);
    }

    #[test]
    fn test_range_bounds_are_inclusive_and_undated_skipped() {
        let set = dated_set(&[Some("1990-01-01"), None, Some("2005-12-31")]);
        assert!(validate_range(&set, date("1990-01-01"), date("2005-12-31")).is_empty());
    }

    #[test]
    fn test_ascending() {
        let set = dated_set(&[Some("1990-01-01"), Some("1995-05-05"), Some("1993-01-01")]);
        assert!(!validate_ascending(&set));
        let (_, prev, _, next) = first_order_break(&set).unwrap();
        assert_eq!((prev, next), (date("1995-05-05"), date("1993-01-01")));

        let set = dated_set(&[
            Some("1990-01-01"),
            Some("1995-05-05"),
            Some("1995-05-05"),
            Some("2000-01-01"),
        ]);
        assert!(validate_ascending(&set));
        assert!(first_order_break(&set).is_none());
    }

    #[test]
    fn test_undated_records_keep_anchor() {
        let set = dated_set(&[Some("2000-01-01"), None, Some("1999-01-01")]);
        assert!(!validate_ascending(&set));

        let set = dated_set(&[None, Some("2000-01-01"), None, None, Some("2001-01-01")]);
        assert!(validate_ascending(&set));
    }

    #[test]
    fn test_out_of_range_ratio() {
        let set = dated_set(&[Some("1985-01-01"), None, Some("1995-06-15"), Some("1996-01-01")]);
        let ratio = out_of_range_ratio(&set, date("1990-01-01"), date("2005-12-31"));
        assert!((ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(
            out_of_range_ratio(&dated_set(&[]), date("1990-01-01"), date("2005-12-31")),
            0.0
        );
    }

    #[test]
    fn test_reason_code_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReasonCode::DateBelowRange).unwrap(),
            "\"DATE_BELOW_RANGE\""
        );
        assert_eq!(ReasonCode::DateAboveRange.to_string(), "DATE_ABOVE_RANGE");
    }
}
