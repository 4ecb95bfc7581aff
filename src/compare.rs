//! Consistency comparison between two result sets
//!
//! Titles are matched by exact, case-insensitive equality of their
//! [`NormalizedKey`]s. Substring containment is available through
//! [`partial_matches`] for diagnostics only; it never feeds the verdict.

use crate::record::{NormalizedKey, ResultSet, Source};
use crate::validate::{validate_ascending, validate_range, Violation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ratio below which the report carries [`LOW_OVERLAP_HINTS`]
pub const LOW_OVERLAP_RATIO: f64 = 0.2;

pub const LOW_OVERLAP_HINTS: &[&str] = &[
    "different pagination or sorting",
    "UI showing different content than API",
    "selectors or API parameters out of date",
];

/// Overlap between two result sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub exact_matches: BTreeSet<NormalizedKey>,
    pub source_a_only: BTreeSet<NormalizedKey>,
    pub source_b_only: BTreeSet<NormalizedKey>,
    /// `|exact_matches| / min(|keys(a)|, |keys(b)|)`, 0 when either side is empty
    pub match_ratio: f64,
}

impl ComparisonReport {
    pub fn match_count(&self) -> usize {
        self.exact_matches.len()
    }

    pub fn match_percentage(&self) -> f64 {
        self.match_ratio * 100.0
    }

    pub fn is_low_overlap(&self) -> bool {
        self.match_ratio < LOW_OVERLAP_RATIO
    }
}

/// Compare two result sets by normalized title
pub fn compare(a: &ResultSet, b: &ResultSet) -> ComparisonReport {
    let keys_a = a.keys();
    let keys_b = b.keys();

    let exact_matches: BTreeSet<NormalizedKey> = keys_a.intersection(&keys_b).cloned().collect();
    let source_a_only: BTreeSet<NormalizedKey> = keys_a.difference(&keys_b).cloned().collect();
    let source_b_only: BTreeSet<NormalizedKey> = keys_b.difference(&keys_a).cloned().collect();

    let smaller = keys_a.len().min(keys_b.len());
    let match_ratio = if smaller == 0 {
        0.0
    } else {
        exact_matches.len() as f64 / smaller as f64
    };

    ComparisonReport {
        exact_matches,
        source_a_only,
        source_b_only,
        match_ratio,
    }
}

/// Number of `a` titles with some `b` title that is equal to it, contains
/// it, or is contained by it (case-insensitive)
pub fn partial_matches(a: &ResultSet, b: &ResultSet) -> usize {
    let keys_b = b.keys();
    a.keys()
        .iter()
        .filter(|ka| {
            keys_b.iter().any(|kb| {
                ka == &kb || kb.as_str().contains(ka.as_str()) || ka.as_str().contains(kb.as_str())
            })
        })
        .count()
}

/// Checks applied to one side of a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideCheck {
    pub source: Source,
    pub records: usize,
    pub ascending: bool,
    pub violations: Vec<Violation>,
}

impl SideCheck {
    pub fn of(set: &ResultSet) -> Self {
        let violations = match (set.filter.from, set.filter.to) {
            (Some(from), Some(to)) => validate_range(set, from, to),
            _ => Vec::new(),
        };
        Self {
            source: set.source,
            records: set.len(),
            ascending: validate_ascending(set),
            violations,
        }
    }
}

/// Pass/fail decision for one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParityVerdict {
    pub report: ComparisonReport,
    pub partial_matches: usize,
    pub side_a: SideCheck,
    pub side_b: SideCheck,
    pub min_match_ratio: f64,
    pub failures: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl ParityVerdict {
    /// Compare `a` and `b` and decide whether they describe the same dataset
    pub fn evaluate(a: &ResultSet, b: &ResultSet, min_match_ratio: f64) -> Self {
        let report = compare(a, b);
        let side_a = SideCheck::of(a);
        let side_b = SideCheck::of(b);
        let mut failures = Vec::new();

        if a.is_empty() {
            failures.push(format!("{} returned no movies", a.source));
        }
        if b.is_empty() {
            failures.push(format!("{} returned no movies", b.source));
        }
        if report.exact_matches.is_empty() {
            failures.push(format!(
                "no matching titles between {} and {}",
                a.source, b.source
            ));
        } else if report.match_ratio < min_match_ratio {
            failures.push(format!(
                "match ratio {:.2} below required {:.2}",
                report.match_ratio, min_match_ratio
            ));
        }
        for side in [&side_a, &side_b] {
            if !side.violations.is_empty() {
                failures.push(format!(
                    "{} has {} release dates outside the requested range",
                    side.source,
                    side.violations.len()
                ));
            }
        }

        let hints = if report.is_low_overlap() {
            LOW_OVERLAP_HINTS.iter().map(|h| h.to_string()).collect()
        } else {
            Vec::new()
        };

        Self {
            partial_matches: partial_matches(a, b),
            report,
            side_a,
            side_b,
            min_match_ratio,
            failures,
            hints,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}
