//! Run reports
//!
//! A [`RunReport`] collects the log of one check run plus its verdict and is
//! written as timestamped JSON.

use crate::compare::ParityVerdict;
use crate::error::Result;
use crate::validate::Violation;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryLevel {
    Info,
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub level: EntryLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub entries: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ParityVerdict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl RunReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            passed: 0,
            failed: 0,
            entries: Vec::new(),
            verdict: None,
            violations: Vec::new(),
        }
    }

    fn push(&mut self, level: EntryLevel, message: String) {
        self.entries.push(ReportEntry {
            level,
            message,
            at: Utc::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.push(EntryLevel::Info, message);
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("PASS {}", message);
        self.passed += 1;
        self.push(EntryLevel::Pass, message);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("FAIL {}", message);
        self.failed += 1;
        self.push(EntryLevel::Fail, message);
    }

    /// Attach a verdict, recording each of its failures
    pub fn set_verdict(&mut self, verdict: ParityVerdict) {
        if verdict.passed() {
            self.pass(format!(
                "{} exact matches, {:.1}% match",
                verdict.report.match_count(),
                verdict.report.match_percentage()
            ));
        } else {
            for failure in &verdict.failures {
                self.fail(failure.clone());
            }
        }
        for hint in &verdict.hints {
            self.info(format!("Low overlap, possible cause: {}", hint));
        }
        self.verdict = Some(verdict);
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// `{name}_{YYYYMMDD_HHMMSS}.json`
    pub fn file_name(&self) -> String {
        let local: DateTime<Local> = self.started_at.with_timezone(&Local);
        format!("{}_{}.json", self.name, local.format("%Y%m%d_%H%M%S"))
    }

    /// Write the report into `dir`, creating it if needed
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        log::info!("Report written to {}", path.display());
        Ok(path)
    }

    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} ({} passed, {} failed)",
            self.name,
            if self.is_success() { "PASSED" } else { "FAILED" },
            self.passed,
            self.failed
        );

        if let Some(verdict) = &self.verdict {
            let report = &verdict.report;
            for side in [&verdict.side_a, &verdict.side_b] {
                let _ = writeln!(
                    out,
                    "  {}: {} records, dates {}",
                    side.source,
                    side.records,
                    if side.ascending { "ascending" } else { "not ascending" }
                );
            }
            let _ = writeln!(out, "  exact matches: {}", report.match_count());
            let _ = writeln!(out, "  partial matches: {}", verdict.partial_matches);
            let _ = writeln!(out, "  match: {:.1}%", report.match_percentage());
            for (label, keys) in [
                (verdict.side_a.source, &report.source_a_only),
                (verdict.side_b.source, &report.source_b_only),
            ] {
                if !keys.is_empty() {
                    let sample: Vec<&str> = keys.iter().take(3).map(|k| k.as_str()).collect();
                    let _ = writeln!(
                        out,
                        "  {}-only ({}): {}",
                        label,
                        keys.len(),
                        sample.join(", ")
                    );
                }
            }
        }

        for violation in self.violations.iter().take(5) {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                violation.reason_code, violation.record_title, violation.detail
            );
        }
        out
    }
}

/// One genre's counts and timings from both surfaces
#[derive(Debug, Clone, Serialize)]
pub struct SurveyRow {
    pub genre: String,
    pub api_count: usize,
    pub ui_count: usize,
    pub api_time: Duration,
    pub ui_time: Duration,
}

pub fn render_survey_table(rows: &[SurveyRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}{:<12}{:<12}{:<12}{}",
        "Genre", "API Count", "UI Count", "API Time", "UI Time"
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<10}{:<12}{:<12}{:<12}{}",
            row.genre,
            row.api_count,
            row.ui_count,
            format!("{:.1}s", row.api_time.as_secs_f64()),
            format!("{:.1}s", row.ui_time.as_secs_f64())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut report = RunReport::new("ui_vs_api");
        report.info("starting");
        report.pass("api returned movies");
        assert!(report.is_success());
        report.fail("ui returned nothing");
        assert!(!report.is_success());
        assert_eq!((report.passed, report.failed), (1, 1));
        assert_eq!(report.entries.len(), 3);
    }

    #[test]
    fn test_file_name_is_timestamped() {
        let report = RunReport::new("date_filtering");
        let name = report.file_name();
        assert!(name.starts_with("date_filtering_"));
        assert!(name.ends_with(".json"));
        // name + '_' + YYYYMMDD_HHMMSS + ".json"
        assert_eq!(name.len(), "date_filtering_".len() + 15 + 5);
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("reports");
        let mut report = RunReport::new("save_test");
        report.pass("ok");

        let path = report.save(&target).await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "save_test");
        assert_eq!(written["entries"][0]["level"], "pass");
    }

    #[test]
    fn test_summary_shows_each_side() {
        use crate::normalize::normalize;
        use crate::record::{FilterParams, Source};
        use serde_json::json;

        let ui = normalize(
            &json!([
                {"title": "Heat", "release_date": "1995-12-15"},
                {"title": "Casino", "release_date": "1995-11-22"}
            ]),
            Source::Ui,
            FilterParams::default(),
        )
        .unwrap();
        let api = normalize(&json!([{"title": "heat"}]), Source::Api, FilterParams::default())
            .unwrap();

        let mut report = RunReport::new("ui_vs_api");
        report.set_verdict(ParityVerdict::evaluate(&ui, &api, 0.0));
        let summary = report.render_summary();
        assert!(summary.contains("UI: 2 records, dates not ascending"), "{}", summary);
        assert!(summary.contains("API: 1 records, dates ascending"), "{}", summary);
    }

    #[test]
    fn test_survey_table() {
        let rows = vec![SurveyRow {
            genre: "Drama".to_string(),
            api_count: 20,
            ui_count: 10,
            api_time: Duration::from_millis(1500),
            ui_time: Duration::from_millis(4200),
        }];
        let table = render_survey_table(&rows);
        assert!(table.starts_with("Genre"));
        assert!(table.contains("Drama     20          10          1.5s        4.2s"));
    }
}
