//! JUnit XML レポートからのテスト結果取得

use anyhow::Context;
use regex::Regex;
use shipflow_config::ReportSettings;
use shipflow_core::{TestResult, TestResultCapture, UnitOutcome, parse_count};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `<testsuite>` 要素の件数を合計してテスト結果を作る
///
/// レポートディレクトリが設定されていればその直下の `*.xml` を読み、
/// 未設定ならテストタスクの出力をレポートとして扱う。
#[derive(Debug, Clone, Default)]
pub struct JunitReportCapture {
    report_dir: Option<PathBuf>,
}

/// 1つ以上の `<testsuite>` から集計した件数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SuiteCounts {
    suites: u32,
    tests: u32,
    failures: u32,
    errors: u32,
    skipped: u32,
}

impl JunitReportCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: Some(dir.into()),
        }
    }

    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self {
            report_dir: settings.junit_dir.clone(),
        }
    }

    pub fn report_dir(&self) -> Option<&Path> {
        self.report_dir.as_deref()
    }

    fn collect(&self, outcome: &UnitOutcome) -> anyhow::Result<SuiteCounts> {
        match &self.report_dir {
            Some(dir) => {
                let mut counts = SuiteCounts::default();
                for file in report_files(dir)? {
                    let content = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read report {}", file.display()))?;
                    counts.add(parse_suites(&content)?);
                }
                Ok(counts)
            }
            None => match outcome.output.as_deref() {
                Some(output) => parse_suites(output),
                None => Ok(SuiteCounts::default()),
            },
        }
    }
}

impl TestResultCapture for JunitReportCapture {
    fn capture(&self, outcome: &UnitOutcome) -> anyhow::Result<TestResult> {
        let counts = self.collect(outcome)?;

        if counts.suites == 0 {
            tracing::debug!("No <testsuite> found; using task outcome only");
            return Ok(if outcome.success {
                TestResult::default()
            } else {
                TestResult::from_counts(1, 0, 1, 0)
            });
        }

        let mut errors = counts.errors;
        if !outcome.success && counts.failures == 0 && errors == 0 {
            // レポート上は成功でもタスクが失敗していれば成功扱いにしない
            tracing::warn!("Test task failed but reports show no failures; counting one error");
            errors = errors.saturating_add(1);
        }

        let result = TestResult::from_counts(counts.tests, counts.failures, errors, counts.skipped);
        tracing::debug!("Captured {} from {} suite(s)", result, counts.suites);
        Ok(result)
    }
}

impl SuiteCounts {
    fn add(&mut self, other: SuiteCounts) {
        self.suites = self.suites.saturating_add(other.suites);
        self.tests = self.tests.saturating_add(other.tests);
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.skipped = self.skipped.saturating_add(other.skipped);
    }
}

fn report_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.xml");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid report pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn parse_suites(xml: &str) -> anyhow::Result<SuiteCounts> {
    // <testsuites> は対象外
    let suite_re = Regex::new(r"<testsuite\b([^>]*)>").context("Invalid testsuite pattern")?;
    let attr_re = Regex::new(r#"([\w:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .context("Invalid attribute pattern")?;

    let mut counts = SuiteCounts::default();
    for cap in suite_re.captures_iter(xml) {
        let attrs: HashMap<&str, &str> = attr_re
            .captures_iter(&cap[1])
            .filter_map(|a| {
                let value = a.get(2).or_else(|| a.get(3))?;
                Some((a.get(1)?.as_str(), value.as_str()))
            })
            .collect();

        counts.add(SuiteCounts {
            suites: 1,
            tests: parse_count(attrs.get("tests").copied(), 0),
            failures: parse_count(attrs.get("failures").copied(), 0),
            errors: parse_count(attrs.get("errors").copied(), 0),
            skipped: parse_count(attrs.get("skipped").copied(), 0),
        });
    }
    Ok(counts)
}
