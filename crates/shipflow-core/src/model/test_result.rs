//! テスト結果

use serde::{Deserialize, Serialize};

/// テストステージの結果
///
/// `success` は `failed == 0 && errors == 0` から導出されるため、
/// フィールドとしては保持しない。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    total: u32,
    passed: u32,
    failed: u32,
    skipped: u32,
    errors: u32,
}

impl TestResult {
    /// 件数から結果を作成
    ///
    /// `passed` は合計から失敗・エラー・スキップを引いた値になる。
    pub fn from_counts(total: u32, failed: u32, errors: u32, skipped: u32) -> Self {
        let passed = total
            .saturating_sub(failed)
            .saturating_sub(errors)
            .saturating_sub(skipped);
        Self {
            total,
            passed,
            failed,
            skipped,
            errors,
        }
    }

    /// 全件成功の結果
    pub fn all_passed(total: u32) -> Self {
        Self::from_counts(total, 0, 0, 0)
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    pub fn total_tests(&self) -> u32 {
        self.total
    }

    pub fn passed_count(&self) -> u32 {
        self.passed
    }

    pub fn failed_count(&self) -> u32 {
        self.failed
    }

    pub fn skipped_count(&self) -> u32 {
        self.skipped
    }

    pub fn error_count(&self) -> u32 {
        self.errors
    }
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tests: {} passed, {} failed, {} errors, {} skipped",
            self.total, self.passed, self.failed, self.errors, self.skipped
        )
    }
}
