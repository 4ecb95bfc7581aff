//! End-to-end checks built from the fetchers, the comparator and the validators
//!
//! Each check returns a [`RunReport`]; fetch failures are recorded as report
//! failures so a run always yields a report.

use crate::api::MovieApi;
use crate::browser::DiscoverPage;
use crate::compare::ParityVerdict;
use crate::config::Config;
use crate::normalize::Normalizer;
use crate::record::{FilterParams, ResultSet};
use crate::report::{RunReport, SurveyRow};
use crate::validate::{
    first_order_break, out_of_range_ratio, validate_ascending, validate_range,
    MAX_OUT_OF_RANGE_RATIO,
};
use std::time::Instant;

/// Genres surveyed by [`genre_survey`]: name and id
pub const SURVEY_GENRES: &[(&str, i64)] = &[
    ("Action", 28),
    ("Comedy", 35),
    ("Drama", 18),
    ("Horror", 27),
];

fn log_sample(report: &mut RunReport, set: &ResultSet) {
    for record in set.records.iter().take(5) {
        match record.release_date {
            Some(date) => report.info(format!("  {} - {} ({})", set.source, record.title, date)),
            None => report.info(format!("  {} - {}", set.source, record.title)),
        }
    }
}

/// Check that the discover endpoint honours its date filter and sort order
pub async fn api_date_accuracy(
    api: &MovieApi,
    filter: &FilterParams,
    normalizer: &Normalizer,
) -> RunReport {
    let mut report = RunReport::new("api_date_filtering");

    let (Some(from), Some(to)) = (filter.from, filter.to) else {
        report.fail("date filtering check needs both a from and a to date");
        return report;
    };

    let set = match api.fetch_result_set(filter, normalizer).await {
        Ok(set) => set,
        Err(e) => {
            report.fail(format!("API request failed: {}", e));
            return report;
        }
    };

    if set.is_empty() {
        report.fail(format!("API returned no movies for {} to {}", from, to));
        return report;
    }
    report.pass(format!("API returned {} movies for {} to {}", set.len(), from, to));
    log_sample(&mut report, &set);

    let violations = validate_range(&set, from, to);
    let ratio = out_of_range_ratio(&set, from, to);
    report.info(format!(
        "{} dated movies, {} out of range",
        set.dated().count(),
        violations.len()
    ));
    if ratio < MAX_OUT_OF_RANGE_RATIO {
        report.pass(format!("{:.1}% of movies outside the date range", ratio * 100.0));
    } else {
        report.fail(format!(
            "More than {:.0}% of movies are outside date range ({:.1}%)",
            MAX_OUT_OF_RANGE_RATIO * 100.0,
            ratio * 100.0
        ));
    }
    report.violations = violations;

    if validate_ascending(&set) {
        report.pass("release dates are in ascending order");
    } else if let Some((prev_title, prev, next_title, next)) = first_order_break(&set) {
        report.fail(format!(
            "release dates not ascending: {} ({}) is followed by {} ({})",
            prev_title, prev, next_title, next
        ));
    }

    report
}

/// Compare the Discover page against the discover endpoint for one genre and year range
pub async fn ui_vs_api(
    api: &MovieApi,
    page: &DiscoverPage<'_>,
    config: &Config,
    genre_id: i64,
    from_year: i32,
    to_year: i32,
) -> RunReport {
    let mut report = RunReport::new("ui_vs_api_comparison");
    let normalizer = config.compare.normalizer();

    let filter = FilterParams::for_years(Some(genre_id), from_year, to_year, config.compare.max_pages);
    report.info(format!(
        "Fetching API results for genre {} from {} to {}",
        genre_id, from_year, to_year
    ));
    let api_set = match api.fetch_result_set(&filter, &normalizer).await {
        Ok(set) => set,
        Err(e) => {
            report.fail(format!("API request failed: {}", e));
            return report;
        }
    };
    report.info(format!("API returned {} movies", api_set.len()));
    log_sample(&mut report, &api_set);

    report.info("Fetching UI results");
    let ui_set = match page
        .fetch_result_set(
            genre_id,
            from_year,
            to_year,
            config.compare.card_limit,
            &normalizer,
        )
        .await
    {
        Ok(set) => set,
        Err(e) => {
            report.fail(format!("UI fetch failed: {}", e));
            return report;
        }
    };
    report.info(format!("UI returned {} movies", ui_set.len()));
    log_sample(&mut report, &ui_set);

    report.set_verdict(ParityVerdict::evaluate(
        &ui_set,
        &api_set,
        config.compare.min_match_ratio,
    ));
    report
}

/// Counts and timings per genre on both surfaces
///
/// A failing genre is logged and recorded with whatever it managed to fetch.
pub async fn genre_survey(
    api: &MovieApi,
    page: &DiscoverPage<'_>,
    config: &Config,
    from_year: i32,
    to_year: i32,
) -> Vec<SurveyRow> {
    let normalizer = config.compare.normalizer();
    let mut rows = Vec::new();

    for (name, genre_id) in SURVEY_GENRES {
        let filter = FilterParams::for_years(Some(*genre_id), from_year, to_year, 1);

        let api_start = Instant::now();
        let api_count = match api.fetch_result_set(&filter, &normalizer).await {
            Ok(set) => set.len(),
            Err(e) => {
                log::warn!("{} API fetch failed: {}", name, e);
                0
            }
        };
        let api_time = api_start.elapsed();

        let ui_start = Instant::now();
        let ui_count = match page
            .fetch_result_set(
                *genre_id,
                from_year,
                to_year,
                config.compare.card_limit,
                &normalizer,
            )
            .await
        {
            Ok(set) => set.len(),
            Err(e) => {
                log::warn!("{} UI fetch failed: {}", name, e);
                0
            }
        };
        let ui_time = ui_start.elapsed();

        log::info!(
            "{}: API {} movies in {:.1}s, UI {} movies in {:.1}s",
            name,
            api_count,
            api_time.as_secs_f64(),
            ui_count,
            ui_time.as_secs_f64()
        );
        rows.push(SurveyRow {
            genre: name.to_string(),
            api_count,
            ui_count,
            api_time,
            ui_time,
        });
    }

    rows
}
