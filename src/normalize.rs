//! Result normalization
//!
//! Raw records arrive as loosely typed JSON, either parsed from the discover
//! endpoint or scraped from the Discover page. They are mapped into a typed
//! [`RawRecord`] at the boundary and then normalized into [`Record`]s.
//!
//! Data-quality gaps (blank titles, unparseable dates, non-numeric genre ids)
//! are absorbed here. Structural problems (not a list, a record without a
//! `title` field) are reported as [`ParityError::InvalidInput`].

use crate::error::{ParityError, Result};
use crate::record::{FilterParams, Record, ResultSet, Source};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeSet;

/// ISO calendar date, always tried first
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Display formats used on the Discover page cards
pub const PAGE_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%m/%d/%Y"];

/// A record as it crossed the boundary, before any cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// `None` when the source sent `"title": null`
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub genre_tokens: Vec<String>,
}

impl RawRecord {
    /// Map one untyped JSON record into its raw typed shape
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            ParityError::InvalidInput(format!("record {} is not an object", index))
        })?;

        let title = match obj.get("title") {
            None => {
                return Err(ParityError::InvalidInput(format!(
                    "record {} has no title field",
                    index
                )))
            }
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ParityError::InvalidInput(format!(
                    "record {} has a non-string title: {}",
                    index, other
                )))
            }
        };

        let release_date = match obj.get("release_date") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let genre_tokens = match obj.get("genre_ids") {
            Some(Value::Array(items)) => items.iter().filter_map(token_of).collect(),
            Some(Value::String(s)) => s.split(',').map(|t| t.to_string()).collect(),
            Some(Value::Number(n)) => vec![n.to_string()],
            _ => Vec::new(),
        };

        Ok(Self {
            title,
            release_date,
            genre_tokens,
        })
    }

    /// Map a JSON array of records
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>> {
        let items = value.as_array().ok_or_else(|| {
            ParityError::InvalidInput(format!(
                "expected a list of records, got {}",
                json_kind(value)
            ))
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, v)| Self::from_value(i, v))
            .collect()
    }
}

fn token_of(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Turns raw records into a [`ResultSet`]
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_formats: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            date_formats: vec![ISO_DATE_FORMAT.to_string()],
        }
    }
}

impl Normalizer {
    /// Accept these `chrono` formats in addition to ISO dates
    pub fn with_formats<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut normalizer = Self::default();
        for format in formats {
            let format = format.into();
            if !normalizer.date_formats.contains(&format) {
                normalizer.date_formats.push(format);
            }
        }
        normalizer
    }

    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    /// Parse a date string against the accepted formats in order
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        self.date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    }

    /// Normalize one raw record; `None` when it has no usable title
    pub fn normalize_record(&self, raw: &RawRecord) -> Option<Record> {
        let title = raw.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            log::debug!("Dropping record without a usable title: {:?}", raw);
            return None;
        }

        let release_date = raw.release_date.as_deref().and_then(|d| {
            let parsed = self.parse_date(d);
            if parsed.is_none() && !d.trim().is_empty() {
                log::debug!("Unparseable release date {:?} for {:?}", d, title);
            }
            parsed
        });

        let genre_ids: BTreeSet<i64> = raw
            .genre_tokens
            .iter()
            .filter_map(|t| t.trim().parse::<i64>().ok())
            .collect();

        Some(Record {
            title: title.to_string(),
            release_date,
            genre_ids,
        })
    }

    /// Normalize already-typed raw records, keeping their order
    pub fn normalize_records(
        &self,
        raw: &[RawRecord],
        source: Source,
        filter: FilterParams,
    ) -> ResultSet {
        let records: Vec<Record> = raw.iter().filter_map(|r| self.normalize_record(r)).collect();
        if records.len() < raw.len() {
            log::info!(
                "{}: dropped {} of {} records without a title",
                source,
                raw.len() - records.len(),
                raw.len()
            );
        }
        ResultSet::new(source, filter, records)
    }

    /// Normalize an untyped JSON list of records
    pub fn normalize(&self, raw: &Value, source: Source, filter: FilterParams) -> Result<ResultSet> {
        let raw = RawRecord::list_from_value(raw)?;
        Ok(self.normalize_records(&raw, source, filter))
    }
}

/// Normalize with the default (ISO only) date formats
pub fn normalize(raw: &Value, source: Source, filter: FilterParams) -> Result<ResultSet> {
    Normalizer::default().normalize(raw, source, filter)
}
