//! Comparator, normalizer and validator behaviour through the public API

use chrono::NaiveDate;
use discover_parity::{
    compare, normalize, validate_ascending, validate_range, FilterParams, NormalizedKey,
    ParityError, ReasonCode, ResultSet, Source,
};
use serde_json::json;
use std::collections::BTreeSet;

fn titles(source: Source, titles: &[&str]) -> ResultSet {
    let raw: Vec<_> = titles.iter().map(|t| json!({ "title": t })).collect();
    normalize(&json!(raw), source, FilterParams::default()).expect("valid records")
}

fn dated(dates: &[&str]) -> ResultSet {
    let raw: Vec<_> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| json!({ "title": format!("Movie {}", i), "release_date": d }))
        .collect();
    normalize(&json!(raw), Source::Api, FilterParams::default()).expect("valid records")
}

fn keys(titles: &[&str]) -> BTreeSet<NormalizedKey> {
    titles.iter().map(|t| NormalizedKey::from_title(t)).collect()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_compare_is_idempotent() {
    let a = titles(Source::Ui, &["Heat", "Casino", "Se7en"]);
    let b = titles(Source::Api, &["heat", "Fargo"]);

    let first = compare(&a, &b);
    let second = compare(&a, &b);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_match_count_is_symmetric() {
    let a = titles(Source::Ui, &["Heat", "Casino", "Se7en"]);
    let b = titles(Source::Api, &["HEAT", "casino", "Fargo", "Clerks"]);

    let ab = compare(&a, &b);
    let ba = compare(&b, &a);
    assert_eq!(ab.match_count(), ba.match_count());
    assert_eq!(ab.source_a_only, ba.source_b_only);
    assert_eq!(ab.source_b_only, ba.source_a_only);
    assert_eq!(ab.match_ratio, ba.match_ratio);
}

#[test]
fn test_self_comparison() {
    let a = titles(Source::Api, &["Heat", "Casino"]);
    let report = compare(&a, &a);
    assert_eq!(report.match_ratio, 1.0);
    assert!(report.source_a_only.is_empty());
    assert!(report.source_b_only.is_empty());
}

#[test]
fn test_empty_comparison() {
    let a = ResultSet::empty(Source::Api);
    let b = ResultSet::empty(Source::Ui);
    let report = compare(&a, &b);
    assert_eq!(report.match_ratio, 0.0);
    assert!(report.exact_matches.is_empty());
    assert!(report.source_a_only.is_empty());
    assert!(report.source_b_only.is_empty());
}

#[test]
fn test_comparator_scenario() {
    let a = titles(Source::Api, &["Inception", "Up"]);
    let b = titles(Source::Ui, &["inception", "Cars"]);
    let report = compare(&a, &b);

    assert_eq!(report.exact_matches, keys(&["inception"]));
    assert_eq!(report.source_a_only, keys(&["up"]));
    assert_eq!(report.source_b_only, keys(&["cars"]));
    assert!((report.match_ratio - 0.5).abs() < 1e-12);
}

#[test]
fn test_whitespace_differences_still_match() {
    let a = titles(Source::Ui, &["  The Godfather\n"]);
    let b = titles(Source::Api, &["the godfather"]);
    assert_eq!(compare(&a, &b).match_ratio, 1.0);
}

#[test]
fn test_range_validator_scenario() {
    let set = dated(&["1985-01-01", "1995-06-15", "2010-12-31"]);
    let violations = validate_range(&set, date("1990-01-01"), date("2005-12-31"));

    let codes: Vec<(&str, ReasonCode)> = violations
        .iter()
        .map(|v| (v.record_title.as_str(), v.reason_code))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("Movie 0", ReasonCode::DateBelowRange),
            ("Movie 2", ReasonCode::DateAboveRange)
        ]
    );
}

#[test]
fn test_ascending_scenarios() {
    assert!(!validate_ascending(&dated(&[
        "1990-01-01",
        "1995-05-05",
        "1993-01-01"
    ])));
    assert!(validate_ascending(&dated(&[
        "1990-01-01",
        "1995-05-05",
        "1995-05-05",
        "2000-01-01"
    ])));
}

#[test]
fn test_unparseable_dates_are_skipped_not_fatal() {
    let set = dated(&["1991-01-01", "not a date", "", "1992-01-01"]);
    assert_eq!(set.len(), 4);
    assert!(validate_ascending(&set));
    assert!(validate_range(&set, date("1990-01-01"), date("2005-12-31")).is_empty());
}

#[test]
fn test_normalizer_scenario() {
    let raw = json!([{"title": " Inception ", "release_date": "2010-07-16", "genre_ids": ["28", "x", 12]}]);
    let set = normalize(&raw, Source::Api, FilterParams::default()).unwrap();

    assert_eq!(set.records[0].title, "Inception");
    assert_eq!(set.records[0].release_date, Some(date("2010-07-16")));
    assert_eq!(set.records[0].genre_ids, BTreeSet::from([12, 28]));
}

#[test]
fn test_contract_violations_are_errors() {
    let cases = vec![
        (json!("Inception"), "string instead of list"),
        (json!([42]), "record is a number"),
        (json!([{"name": "Inception"}]), "title field missing"),
        (json!([{"title": 7}]), "title is a number"),
    ];

    for (raw, description) in cases {
        let result = normalize(&raw, Source::Ui, FilterParams::default());
        assert!(
            matches!(result, Err(ParityError::InvalidInput(_))),
            "{} should be invalid input",
            description
        );
    }
}
