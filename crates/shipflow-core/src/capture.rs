//! テスト結果の取得

use crate::model::TestResult;
use crate::task::UnitOutcome;

/// テストタスクの出力から [`TestResult`] を組み立てる
pub trait TestResultCapture: Send + Sync {
    fn capture(&self, outcome: &UnitOutcome) -> anyhow::Result<TestResult>;
}

/// 件数のパース。不正な値や未指定の場合は `default` を返す
pub fn parse_count(raw: Option<&str>, default: u32) -> u32 {
    raw.map(str::trim)
        .and_then(|value| {
            value.parse::<u32>().ok().or_else(|| {
                // "3.0" のような表記も受け付ける
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| {
                        v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64 && v.fract() == 0.0
                    })
                    .map(|v| v as u32)
            })
        })
        .unwrap_or(default)
}
